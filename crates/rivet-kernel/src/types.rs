use core::fmt;
use core::num::NonZeroU32;

/// Scheduling priority. Larger numbers run first.
pub type Priority = u8;

/// Lowest priority; the idle thread runs here.
pub const PRI_MIN: Priority = 0;
/// Priority of the initial thread and the usual choice for new threads.
pub const PRI_DEFAULT: Priority = 31;
/// Highest priority.
pub const PRI_MAX: Priority = 63;

/// MLFQS niceness. Higher values give the CPU away more readily.
pub type Nice = i32;

pub const NICE_MIN: Nice = -20;
pub const NICE_DEFAULT: Nice = 0;
pub const NICE_MAX: Nice = 20;

/// Timer ticks since boot.
pub type Tick = u64;

/// Thread identifier
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ThreadId(NonZeroU32);

impl ThreadId {
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    pub fn val(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn new(id: u32) -> Self {
                Self(id)
            }

            pub fn val(&self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

object_id!(
    /// Handle of a semaphore in the kernel's object table.
    SemaphoreId,
    "sema"
);
object_id!(
    /// Handle of a lock in the kernel's object table.
    LockId,
    "lock"
);
object_id!(
    /// Handle of a condition variable in the kernel's object table.
    CondvarId,
    "cond"
);
