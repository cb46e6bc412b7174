mod common;

use common::{boot, Transcript};
use rivet_kernel::{KernelConfig, Lock, ThreadState, PRI_DEFAULT};
use std::sync::Arc;

#[test]
fn blocked_high_thread_lends_its_priority() {
    let k = boot(KernelConfig::default());
    let log = Transcript::default();
    let lock = Arc::new(Lock::new(&k));
    k.set_priority(10);
    lock.acquire();

    let (l, log2) = (Arc::clone(&lock), log.clone());
    let high = k
        .create("H", 30, move || {
            l.acquire();
            log2.push("H acquired");
            l.release();
        })
        .unwrap();
    assert_eq!(k.priority(), 30);
    assert_eq!(k.thread(k.current()).unwrap().base_priority, 10);
    assert_eq!(k.thread(k.current()).unwrap().donors, vec![high]);
    k.check_invariants();

    lock.release();
    log.push("main after release");
    assert_eq!(k.priority(), 10);
    assert_eq!(log.lines(), ["H acquired", "main after release"]);
    k.check_invariants();
    k.shutdown();
}

#[test]
fn highest_donor_gets_the_lock_first() {
    let k = boot(KernelConfig::default());
    let log = Transcript::default();
    let lock = Arc::new(Lock::new(&k));
    lock.acquire();
    for (name, priority) in [("acquire1", PRI_DEFAULT + 1), ("acquire2", PRI_DEFAULT + 2)] {
        let (l, log) = (Arc::clone(&lock), log.clone());
        k.create(name, priority, move || {
            l.acquire();
            log.push(format!("{name}: got the lock"));
            l.release();
            log.push(format!("{name}: done"));
        })
        .unwrap();
        assert_eq!(k.priority(), priority);
    }
    lock.release();
    log.push("main: released");
    assert_eq!(
        log.lines(),
        [
            "acquire2: got the lock",
            "acquire2: done",
            "acquire1: got the lock",
            "acquire1: done",
            "main: released",
        ]
    );
    assert_eq!(k.priority(), PRI_DEFAULT);
    k.check_invariants();
    k.shutdown();
}

#[test]
fn lowering_base_keeps_the_donation() {
    let k = boot(KernelConfig::default());
    let lock = Arc::new(Lock::new(&k));
    lock.acquire();
    let l = Arc::clone(&lock);
    k.create("acquire", PRI_DEFAULT + 10, move || {
        l.acquire();
        l.release();
    })
    .unwrap();
    assert_eq!(k.priority(), PRI_DEFAULT + 10);
    k.set_priority(PRI_DEFAULT - 10);
    assert_eq!(k.priority(), PRI_DEFAULT + 10);
    lock.release();
    assert_eq!(k.priority(), PRI_DEFAULT - 10);
    k.check_invariants();
    k.shutdown();
}

/// T1 holds L1 and sleeps. T2 holds L2 and waits for L1. T3 holds L3 and
/// waits for L2. Main then waits for L3.
fn build_chain(k: &rivet_kernel::Kernel, log: &Transcript) -> (Vec<Arc<Lock>>, Vec<rivet_kernel::ThreadId>) {
    let locks: Vec<Arc<Lock>> = (0..3).map(|_| Arc::new(Lock::new(k))).collect();
    let mut ids = Vec::new();
    for i in 0..3 {
        let k2 = k.clone();
        let log = log.clone();
        let own = Arc::clone(&locks[i]);
        let wants = i.checked_sub(1).map(|j| Arc::clone(&locks[j]));
        let name = format!("T{}", i + 1);
        let id = k
            .create(&name.clone(), 40 + i as u8, move || {
                own.acquire();
                match &wants {
                    Some(lock) => {
                        lock.acquire();
                        log.push(format!("{name}:{}", k2.priority()));
                        lock.release();
                    }
                    None => {
                        k2.sleep(5);
                        log.push(format!("{name}:{}", k2.priority()));
                    }
                }
                own.release();
            })
            .unwrap();
        ids.push(id);
    }
    (locks, ids)
}

#[test]
fn donation_follows_the_chain() {
    let k = boot(KernelConfig::default());
    let log = Transcript::default();
    let (locks, ids) = build_chain(&k, &log);
    let priorities: Vec<_> = ids.iter().map(|&id| k.thread(id).unwrap().priority).collect();
    assert_eq!(priorities, [42, 42, 42]);
    assert_eq!(k.thread(ids[0]).unwrap().state, ThreadState::Blocked);
    k.check_invariants();

    k.set_priority(50);
    locks[2].acquire();
    log.push("main");
    assert_eq!(log.lines(), ["T1:50", "T2:50", "T3:50", "main"]);
    locks[2].release();

    // Let the chain finish and give back what it borrowed.
    k.set_priority(0);
    for &id in &ids {
        assert!(k.thread(id).map_or(true, |t| t.state == ThreadState::Dying));
    }
    k.check_invariants();
    k.shutdown();
}

#[test]
#[should_panic(expected = "donation chain")]
fn donation_past_the_depth_limit_is_fatal() {
    let k = boot(KernelConfig {
        donation_depth: 2,
        ..KernelConfig::default()
    });
    let log = Transcript::default();
    let (locks, _) = build_chain(&k, &log);
    k.set_priority(50);
    locks[2].acquire();
}

#[test]
#[should_panic(expected = "lock-wait cycle")]
fn lock_wait_cycle_is_fatal() {
    let k = boot(KernelConfig::default());
    let (x, y) = (Arc::new(Lock::new(&k)), Arc::new(Lock::new(&k)));
    y.acquire();

    let (x2, y2) = (Arc::clone(&x), Arc::clone(&y));
    k.create("A", 20, move || {
        x2.acquire();
        y2.acquire();
    })
    .unwrap();
    // A holds X and waits for Y, lending nothing since main outranks it.
    k.sleep(1);
    x.acquire();
}
