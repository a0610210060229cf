//! Limits on the multiprocessor topology.

/// The maximum number of CPU cores the kernel will bring online.
pub const SMP_MAX_CPUS: usize = 4;

/// A core number is `(cluster << SMP_CPU_CLUSTER_SHIFT) | cpu_within_cluster`.
pub const SMP_CPU_CLUSTER_SHIFT: usize = 2;
