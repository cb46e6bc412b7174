pub mod condvar;
pub mod lock;
pub mod semaphore;
pub mod spinlock;

pub use condvar::Condvar;
pub use lock::Lock;
pub use semaphore::Semaphore;
