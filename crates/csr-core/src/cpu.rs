//! `ScanContext::core_usage` translates to a CPU-affinity mask applied to
//! the calling worker thread before engine invocation, and reset after
//! the request completes.

use csr_model::CoreUsage;

/// Pins the calling thread's CPU affinity for the lifetime of the guard,
/// restoring the full-core mask on drop.
pub struct CoreAffinityGuard {
    _private: (),
}

impl Drop for CoreAffinityGuard {
    fn drop(&mut self) {
        imp::reset_affinity();
    }
}

/// Applies `usage`'s core count to the calling thread and returns a guard
/// that resets the mask when dropped. Call this on the worker thread
/// immediately before invoking the engine.
pub fn apply_core_usage(usage: CoreUsage) -> CoreAffinityGuard {
    let total = imp::total_cpus();
    imp::set_affinity(usage.core_count(total));
    CoreAffinityGuard { _private: () }
}

#[cfg(target_os = "linux")]
mod imp {
    use std::mem::{size_of, zeroed};

    pub fn total_cpus() -> usize {
        let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
        if n > 0 {
            n as usize
        } else {
            1
        }
    }

    pub fn set_affinity(n: usize) {
        let total = total_cpus();
        let n = n.clamp(1, total);
        unsafe {
            let mut set: libc::cpu_set_t = zeroed();
            libc::CPU_ZERO(&mut set);
            for cpu in 0..n {
                libc::CPU_SET(cpu, &mut set);
            }
            libc::sched_setaffinity(0, size_of::<libc::cpu_set_t>(), &set);
        }
    }

    pub fn reset_affinity() {
        set_affinity(total_cpus());
    }
}

#[cfg(not(target_os = "linux"))]
mod imp {
    pub fn total_cpus() -> usize {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    }

    pub fn set_affinity(_n: usize) {
        // No portable affinity API outside Linux; core_usage becomes
        // advisory on other platforms.
    }

    pub fn reset_affinity() {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_can_be_constructed_and_dropped_for_every_usage() {
        for usage in [CoreUsage::Default, CoreUsage::All, CoreUsage::Half, CoreUsage::Single] {
            let _guard = apply_core_usage(usage);
        }
    }
}
