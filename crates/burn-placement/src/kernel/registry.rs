use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;

use super::{
    Add, BinaryFunc, Div, KernelComputeContext, KernelError, KernelRegContext, Mul, OpKernel,
    OperandOrder, RegistryError, ScalarBinaryKernel,
};
use crate::ops::SbpOperator;
use crate::{DataType, DeviceType, Element};

/// Creates a fresh kernel instance.
pub type KernelCreateFn = Box<dyn Fn() -> Box<dyn OpKernel> + Send + Sync>;

/// Decides whether a registration applies to a concrete invocation.
pub type KernelMatchPred = Box<dyn Fn(&KernelRegContext) -> bool + Send + Sync>;

/// Exact key a kernel is registered and looked up under.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct KernelKey {
    /// Operator name.
    pub op_type_name: String,
    /// Device kind.
    pub device_type: DeviceType,
    /// Element data type of the output.
    pub data_type: DataType,
}

impl fmt::Display for KernelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} for {}",
            self.op_type_name, self.device_type, self.data_type
        )
    }
}

/// A registered kernel factory and its match predicate.
pub struct KernelRegistration {
    create_fn: KernelCreateFn,
    is_matched: KernelMatchPred,
}

impl fmt::Debug for KernelRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelRegistration").finish_non_exhaustive()
    }
}

/// Collects kernel registrations before freezing them into a [`KernelRegistry`].
#[derive(Debug, Default)]
pub struct KernelRegistryBuilder {
    entries: Vec<(KernelKey, KernelRegistration)>,
}

impl KernelRegistryBuilder {
    /// Creates a builder with no registration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a kernel factory under `(op_type_name, device_type, data_type)`.
    pub fn register<C, P>(
        mut self,
        op_type_name: &str,
        device_type: DeviceType,
        data_type: DataType,
        create_fn: C,
        is_matched: P,
    ) -> Self
    where
        C: Fn() -> Box<dyn OpKernel> + Send + Sync + 'static,
        P: Fn(&KernelRegContext) -> bool + Send + Sync + 'static,
    {
        let key = KernelKey {
            op_type_name: op_type_name.to_string(),
            device_type,
            data_type,
        };
        self.entries.push((
            key,
            KernelRegistration {
                create_fn: Box::new(create_fn),
                is_matched: Box::new(is_matched),
            },
        ));
        self
    }

    /// Registers a kernel factory matched when the device and the output
    /// data type are exactly the registered ones.
    pub fn register_exact<C>(
        self,
        op_type_name: &str,
        device_type: DeviceType,
        data_type: DataType,
        create_fn: C,
    ) -> Self
    where
        C: Fn() -> Box<dyn OpKernel> + Send + Sync + 'static,
    {
        self.register(op_type_name, device_type, data_type, create_fn, move |ctx| {
            ctx.device_type == device_type && ctx.data_type == data_type
        })
    }

    fn register_scalar_binary<F: BinaryFunc, E: Element>(
        self,
        op_type_name: &str,
        order: OperandOrder,
    ) -> Self {
        self.register_exact(op_type_name, DeviceType::Cpu, E::DATA_TYPE, move || {
            Box::new(ScalarBinaryKernel::<F, E>::new(order))
        })
    }

    /// Freezes the registrations.
    ///
    /// Two registrations claiming the same key are a configuration error:
    /// nothing decides which one should win.
    pub fn build(self) -> Result<KernelRegistry, RegistryError> {
        let mut kernels = HashMap::with_capacity(self.entries.len());
        for (key, registration) in self.entries {
            if kernels.contains_key(&key) {
                return Err(RegistryError::Conflict(key));
            }
            log::debug!("Registering kernel {key}");
            kernels.insert(key, registration);
        }
        Ok(KernelRegistry { kernels })
    }
}

macro_rules! register_scalar_binary {
    ($builder:expr, $op:literal, $func:ty, $order:expr, [$($elem:ty),* $(,)?]) => {
        $builder$(.register_scalar_binary::<$func, $elem>($op, $order))*
    };
}

/// Read-only map from `(operator, device, data type)` to kernel factories.
///
/// Build it once during startup; lookups need no locking afterwards.
#[derive(Debug)]
pub struct KernelRegistry {
    kernels: HashMap<KernelKey, KernelRegistration>,
}

impl KernelRegistry {
    /// Starts collecting registrations.
    pub fn builder() -> KernelRegistryBuilder {
        KernelRegistryBuilder::new()
    }

    /// Registers the CPU scalar binary kernels.
    ///
    /// `scalar_add` covers every element type; `scalar_mul`,
    /// `left_scalar_div` and `right_scalar_div` leave out the 8-bit integers.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::register_builtin(Self::builder()).build()
    }

    /// Adds the builtin registrations to `builder`.
    pub fn register_builtin(builder: KernelRegistryBuilder) -> KernelRegistryBuilder {
        use half::{bf16, f16};
        use OperandOrder::*;

        let builder = register_scalar_binary!(
            builder,
            "scalar_add",
            Add,
            Commutative,
            [i8, u8, i32, i64, f16, bf16, f32, f64]
        );
        let builder = register_scalar_binary!(
            builder,
            "scalar_mul",
            Mul,
            Commutative,
            [i32, i64, f16, bf16, f32, f64]
        );
        let builder = register_scalar_binary!(
            builder,
            "left_scalar_div",
            Div,
            Left,
            [i32, i64, f16, bf16, f32, f64]
        );
        register_scalar_binary!(
            builder,
            "right_scalar_div",
            Div,
            Right,
            [i32, i64, f16, bf16, f32, f64]
        )
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// Whether a kernel is registered under the exact key.
    pub fn contains(
        &self,
        op_type_name: &str,
        device_type: DeviceType,
        data_type: DataType,
    ) -> bool {
        self.kernels.contains_key(&KernelKey {
            op_type_name: op_type_name.to_string(),
            device_type,
            data_type,
        })
    }

    /// Creates the kernel registered for `op_type_name` that matches `ctx`.
    pub fn find_kernel(
        &self,
        op_type_name: &str,
        ctx: &KernelRegContext,
    ) -> Result<Box<dyn OpKernel>, KernelError> {
        let key = KernelKey {
            op_type_name: op_type_name.to_string(),
            device_type: ctx.device_type,
            data_type: ctx.data_type,
        };
        match self.kernels.get(&key) {
            Some(registration) if (registration.is_matched)(ctx) => {
                log::debug!("Selected kernel {key}");
                Ok((registration.create_fn)())
            }
            _ => Err(KernelError::NotFound(key)),
        }
    }

    /// Selects the kernel of `op` from its first output in `ctx` and runs it.
    ///
    /// Every input and output the operator declares must be bound. Returns
    /// whether the kernel ran: kernels that opt out are skipped when every
    /// output is empty.
    pub fn launch(
        &self,
        op: &dyn SbpOperator,
        ctx: &mut KernelComputeContext,
    ) -> Result<bool, KernelError> {
        for bn in op.input_bns() {
            ctx.blob_id(bn, 0)?;
        }
        let output_bns = op.output_bns();
        let out = output_bns
            .first()
            .ok_or(KernelError::NoOutput(op.op_type_name()))?;
        let kernel = self.find_kernel(op.op_type_name(), &ctx.reg_context(out)?)?;
        super::launch(kernel.as_ref(), ctx, output_bns)
    }
}
