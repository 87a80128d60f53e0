//! Blending of the low- and high-order operators and final assembly.

use super::{ElementContext, check_len, for_each_element};
use crate::backend::{Binding, Kernel, KernelError, KernelMemory, LaunchArgs, Progress};
use std::sync::Arc;

/// Copies one buffer into another of the same size.
pub struct CopyBuffer {
    name: &'static str,
    src: Binding,
    dst: Binding,
}

impl CopyBuffer {
    pub fn new(name: &'static str, src: Binding, dst: Binding) -> Self {
        Self { name, src, dst }
    }
}

impl Kernel for CopyBuffer {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<Progress, KernelError> {
        mem.with_output(self.dst, |dst, inputs| {
            let src = inputs.read(self.src)?;
            check_len(self.name, src, dst.len())?;
            dst.copy_from_slice(src);
            Ok(Progress::Done)
        })
    }
}

/// scal_fpts ← α scal_fpts_cpy + (1 - α) scal_fpts, α per element.
pub struct BlendInterfaceFlux {
    ctx: Arc<ElementContext>,
    alpha: Binding,
    lo: Binding,
    fpts: Binding,
}

impl BlendInterfaceFlux {
    pub fn new(ctx: &Arc<ElementContext>, alpha: Binding, lo: Binding, fpts: Binding) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            alpha,
            lo,
            fpts,
        }
    }
}

impl Kernel for BlendInterfaceFlux {
    fn name(&self) -> &str {
        "blendintflux"
    }

    fn run(&self, mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<Progress, KernelError> {
        let ctx = &*self.ctx;
        let fs = ctx.fpts_stride();
        mem.with_output(self.fpts, |fpts, inputs| {
            let alpha = inputs.read(self.alpha)?;
            let lo = inputs.read(self.lo)?;
            check_len("alpha", alpha, ctx.neles)?;
            check_len("scal_fpts_cpy", lo, ctx.neles * fs)?;
            check_len("scal_fpts", fpts, ctx.neles * fs)?;
            for_each_element(fpts, fs, |e, f| {
                let a = alpha[e];
                for (ho, l) in f.iter_mut().zip(&lo[e * fs..(e + 1) * fs]) {
                    *ho = a * l + (1.0 - a) * *ho;
                }
            });
            Ok(Progress::Done)
        })
    }
}

/// out ← α divf_lo + (1 - α) divf_rd, α per element.
pub struct BlendDivergence {
    ctx: Arc<ElementContext>,
    alpha: Binding,
    lo: Binding,
    ho: Binding,
    out: Binding,
}

impl BlendDivergence {
    pub fn new(
        ctx: &Arc<ElementContext>,
        alpha: Binding,
        lo: Binding,
        ho: Binding,
        out: Binding,
    ) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            alpha,
            lo,
            ho,
            out,
        }
    }
}

impl Kernel for BlendDivergence {
    fn name(&self) -> &str {
        "blenddivf"
    }

    fn run(&self, mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<Progress, KernelError> {
        let ctx = &*self.ctx;
        let us = ctx.upts_stride();
        mem.with_output(self.out, |out, inputs| {
            let alpha = inputs.read(self.alpha)?;
            let lo = inputs.read(self.lo)?;
            let ho = inputs.read(self.ho)?;
            check_len("alpha", alpha, ctx.neles)?;
            check_len("divf_lo", lo, ctx.neles * us)?;
            check_len("divf_rd", ho, ctx.neles * us)?;
            check_len("scal_upts", out, ctx.neles * us)?;
            for_each_element(out, us, |e, o| {
                let a = alpha[e];
                let range = e * us..(e + 1) * us;
                for ((o, l), h) in o.iter_mut().zip(&lo[range.clone()]).zip(&ho[range]) {
                    *o = a * l + (1.0 - a) * h;
                }
            });
            Ok(Progress::Done)
        })
    }
}

/// out ← -src, or out ← -out when no source buffer is bound.
///
/// Non-finite results are reported with the first offending element.
pub struct NegDivConf {
    name: &'static str,
    ctx: Arc<ElementContext>,
    src: Option<Binding>,
    out: Binding,
}

impl NegDivConf {
    pub fn new(name: &'static str, ctx: &Arc<ElementContext>, src: Option<Binding>, out: Binding) -> Self {
        Self {
            name,
            ctx: Arc::clone(ctx),
            src,
            out,
        }
    }
}

impl Kernel for NegDivConf {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<Progress, KernelError> {
        let ctx = &*self.ctx;
        let us = ctx.upts_stride();
        mem.with_output(self.out, |out, inputs| {
            check_len("scal_upts", out, ctx.neles * us)?;
            match self.src {
                Some(src) => {
                    let src = inputs.read(src)?;
                    check_len(self.name, src, out.len())?;
                    for (o, s) in out.iter_mut().zip(src) {
                        *o = -s;
                    }
                }
                None => out.iter_mut().for_each(|o| *o = -*o),
            }
            match out.iter().position(|v| !v.is_finite()) {
                Some(at) => Err(KernelError::NonFinite {
                    buffer: "scal_upts".into(),
                    element: at / us,
                }),
                None => Ok(Progress::Done),
            }
        })
    }
}

/// Placeholder for a slot whose kernel does not exist yet.
pub struct Unsupported {
    name: &'static str,
}

impl Unsupported {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Kernel for Unsupported {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, _mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<Progress, KernelError> {
        Err(KernelError::NotImplemented(self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ActiveBanks, BufferPool};
    use crate::elements::test_support::periodic_set;
    use crate::equations::Advection2D;

    #[test]
    fn test_blend_endpoints() {
        let mut pool = BufferPool::new();
        let (_, set) = periodic_set(1, 2, 1, Arc::new(Advection2D::new(1.0, 0.0)), &mut pool);
        let b = set.buffers;
        pool.bank_mut(b.alpha, 0).unwrap().copy_from_slice(&[1.0, 0.0]);
        pool.bank_mut(b.divf_lo, 0).unwrap().fill(2.0);
        pool.bank_mut(b.divf_rd, 0).unwrap().fill(-3.0);
        pool.bank_mut(b.scal_fpts_cpy, 0).unwrap().fill(4.0);
        pool.bank_mut(b.scal_fpts, 0).unwrap().fill(5.0);

        let mut mem = pool.memory(ActiveBanks::new(0, 1));
        let kernels: [Box<dyn Kernel>; 2] = [
            Box::new(BlendInterfaceFlux::new(
                &set.ctx,
                b.alpha.plain(),
                b.scal_fpts_cpy.plain(),
                b.scal_fpts.plain(),
            )),
            Box::new(BlendDivergence::new(
                &set.ctx,
                b.alpha.plain(),
                b.divf_lo.plain(),
                b.divf_rd.plain(),
                b.scal_upts.output(),
            )),
        ];
        for k in &kernels {
            k.run(&mut mem, &LaunchArgs::default()).unwrap();
        }

        let (us, fs) = (set.ctx.upts_stride(), set.ctx.fpts_stride());
        let out = mem.read(b.scal_upts.output()).unwrap();
        assert!(out[..us].iter().all(|&v| v == 2.0));
        assert!(out[us..].iter().all(|&v| v == -3.0));
        let fpts = mem.read(b.scal_fpts.plain()).unwrap();
        assert!(fpts[..fs].iter().all(|&v| v == 4.0));
        assert!(fpts[fs..].iter().all(|&v| v == 5.0));
    }

    #[test]
    fn test_negdivconf_in_place_and_from_source() {
        let mut pool = BufferPool::new();
        let (_, set) = periodic_set(1, 1, 1, Arc::new(Advection2D::new(1.0, 0.0)), &mut pool);
        let b = set.buffers;
        pool.bank_mut(b.scal_upts, 1).unwrap().fill(1.5);
        pool.bank_mut(b.divf_rd, 0).unwrap().fill(0.25);

        let mut mem = pool.memory(ActiveBanks::new(0, 1));
        NegDivConf::new("negdivconf", &set.ctx, None, b.scal_upts.output())
            .run(&mut mem, &LaunchArgs::default())
            .unwrap();
        assert!(mem.read(b.scal_upts.output()).unwrap().iter().all(|&v| v == -1.5));

        NegDivConf::new("negdivconf_rd", &set.ctx, Some(b.divf_rd.plain()), b.scal_upts.output())
            .run(&mut mem, &LaunchArgs::default())
            .unwrap();
        assert!(mem.read(b.scal_upts.output()).unwrap().iter().all(|&v| v == -0.25));
    }

    #[test]
    fn test_negdivconf_reports_non_finite() {
        let mut pool = BufferPool::new();
        let (_, set) = periodic_set(1, 2, 1, Arc::new(Advection2D::new(1.0, 0.0)), &mut pool);
        let b = set.buffers;
        let us = set.ctx.upts_stride();
        pool.bank_mut(b.scal_upts, 0).unwrap()[us + 2] = f64::NAN;

        let mut mem = pool.memory(ActiveBanks::default());
        let err = NegDivConf::new("negdivconf", &set.ctx, None, b.scal_upts.output())
            .run(&mut mem, &LaunchArgs::default())
            .unwrap_err();
        assert_eq!(
            err,
            KernelError::NonFinite {
                buffer: "scal_upts".into(),
                element: 1
            }
        );
    }

    #[test]
    fn test_unsupported_kernel_fails() {
        let mut pool = BufferPool::new();
        let err = Unsupported::new("tdivf_qpts")
            .run(&mut pool.memory(ActiveBanks::default()), &LaunchArgs::default())
            .unwrap_err();
        assert_eq!(err, KernelError::NotImplemented("tdivf_qpts"));
    }
}
