use alloc::sync::Arc;

use spin::RwLock;

use super::{KernelRegistry, RegistryError};

static GLOBAL_KERNEL_REGISTRY: RwLock<Option<Arc<KernelRegistry>>> = RwLock::new(None);

/// Installs the process-wide kernel registry.
///
/// Call once during startup, before any execution thread looks kernels up.
/// A second call leaves the installed registry untouched and fails until
/// [`reset_global_registry`] clears it.
pub fn init_global_registry(
    registry: KernelRegistry,
) -> Result<Arc<KernelRegistry>, RegistryError> {
    let mut global = GLOBAL_KERNEL_REGISTRY.write();
    if global.is_some() {
        return Err(RegistryError::AlreadyInitialized);
    }

    let registry = Arc::new(registry);
    log::debug!("Installed global kernel registry with {} kernel(s)", registry.len());
    *global = Some(registry.clone());
    Ok(registry)
}

/// The process-wide kernel registry, once installed.
pub fn global_registry() -> Option<Arc<KernelRegistry>> {
    GLOBAL_KERNEL_REGISTRY.read().clone()
}

/// Uninstalls the process-wide kernel registry and returns it.
///
/// Handles already obtained from [`global_registry`] stay valid.
pub fn reset_global_registry() -> Option<Arc<KernelRegistry>> {
    let previous = GLOBAL_KERNEL_REGISTRY.write().take();
    if previous.is_some() {
        log::debug!("Reset global kernel registry");
    }
    previous
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{Add, OperandOrder, ScalarBinaryKernel};
    use crate::{DataType, DeviceType};
    use alloc::boxed::Box;

    // The only test touching the process-wide registry.
    #[test]
    fn test_global_registry_is_installed_once_until_reset() {
        let registry = init_global_registry(KernelRegistry::builtin().unwrap()).unwrap();
        assert!(!registry.is_empty());
        assert!(global_registry().is_some());

        let second = init_global_registry(KernelRegistry::builder().build().unwrap());
        assert_eq!(second.err(), Some(RegistryError::AlreadyInitialized));
        assert_eq!(global_registry().map(|global| global.len()), Some(registry.len()));

        let previous = reset_global_registry().unwrap();
        assert!(Arc::ptr_eq(&previous, &registry));
        assert!(global_registry().is_none());
        assert!(reset_global_registry().is_none());

        let rebuilt = KernelRegistry::builder()
            .register_exact("scalar_add", DeviceType::Cpu, DataType::Float32, || {
                Box::new(ScalarBinaryKernel::<Add, f32>::new(OperandOrder::Commutative))
            })
            .build()
            .unwrap();
        init_global_registry(rebuilt).unwrap();
        let global = global_registry().unwrap();
        assert_eq!(global.len(), 1);
        assert!(global.contains("scalar_add", DeviceType::Cpu, DataType::Float32));
        // The handle taken before the reset still sees the builtin kernels.
        assert!(registry.contains("scalar_mul", DeviceType::Cpu, DataType::Int32));

        reset_global_registry();
    }
}
