//! Source terms and the kernel that adds them to the right-hand side.
//!
//! A [`SourceTerm`] is evaluated pointwise on the solution copy taken before
//! the divergence kernels run, so it sees the input state even when input
//! and output banks coincide. Terms that damp near bodies receive the
//! distance to the nearest wall from a [`Geometry`] profile.
//!
//! # Submodules
//!
//! - `terms`: [`WallSponge`], [`BodyForce`]
//! - `wall_distance`: [`Geometry`] distance profiles

mod terms;
mod wall_distance;

pub use terms::{BodyForce, SpongeProfile, WallSponge};
pub use wall_distance::{FAR_FIELD_DISTANCE, Geometry};

use crate::backend::{Binding, Kernel, KernelError, KernelMemory, LaunchArgs, Progress};
use crate::elements::{ElementContext, check_len, for_each_element};
use crate::equations::MAX_VARS;
use std::fmt::Debug;
use std::sync::Arc;

/// Everything a source term may depend on at one solution point.
#[derive(Clone, Copy, Debug)]
pub struct SourceContext<'a> {
    pub time: f64,
    pub position: (f64, f64),
    pub state: &'a [f64],
    /// Distance to the nearest wall, when the system computed one
    pub wall_distance: Option<f64>,
}

/// A pointwise source S(q, x, t).
pub trait SourceTerm: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Write S into `out` (length nvars).
    fn evaluate(&self, ctx: &SourceContext<'_>, out: &mut [f64]);

    /// Whether `ctx.wall_distance` must be populated.
    fn needs_wall_distance(&self) -> bool {
        false
    }
}

/// Sum of several source terms.
#[derive(Debug, Default)]
pub struct CombinedSource {
    terms: Vec<Arc<dyn SourceTerm>>,
}

impl CombinedSource {
    pub fn new(terms: Vec<Arc<dyn SourceTerm>>) -> Self {
        Self { terms }
    }

    pub fn with(mut self, term: Arc<dyn SourceTerm>) -> Self {
        self.terms.push(term);
        self
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl SourceTerm for CombinedSource {
    fn name(&self) -> &'static str {
        "combined"
    }

    fn evaluate(&self, ctx: &SourceContext<'_>, out: &mut [f64]) {
        out.fill(0.0);
        let mut part = [0.0; MAX_VARS];
        let nv = out.len().min(MAX_VARS);
        for term in &self.terms {
            term.evaluate(ctx, &mut part[..nv]);
            for (o, s) in out.iter_mut().zip(&part[..nv]) {
                *o += s;
            }
        }
    }

    fn needs_wall_distance(&self) -> bool {
        self.terms.iter().any(|t| t.needs_wall_distance())
    }
}

/// Adds S(q, x, t) to the output bank.
pub struct SourceKernel {
    ctx: Arc<ElementContext>,
    source: Arc<dyn SourceTerm>,
    soln: Binding,
    walldist: Option<Binding>,
    out: Binding,
}

impl SourceKernel {
    pub fn new(
        ctx: &Arc<ElementContext>,
        source: Arc<dyn SourceTerm>,
        soln: Binding,
        walldist: Option<Binding>,
        out: Binding,
    ) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            source,
            soln,
            walldist,
            out,
        }
    }
}

impl Kernel for SourceKernel {
    fn name(&self) -> &str {
        "source"
    }

    fn run(&self, mem: &mut KernelMemory<'_>, args: &LaunchArgs) -> Result<Progress, KernelError> {
        let ctx = &*self.ctx;
        let nv = ctx.nvars;
        let nu = ctx.points.n_upts();
        let stride = ctx.upts_stride();
        let time = args.time_or_zero();

        mem.with_output(self.out, |out, inputs| {
            let soln = inputs.read(self.soln)?;
            let walldist = self.walldist.map(|b| inputs.read(b)).transpose()?;
            check_len("soln_copy", soln, ctx.neles * stride)?;
            check_len("scal_upts", out, ctx.neles * stride)?;
            if let Some(d) = walldist {
                check_len("walldist", d, ctx.neles * nu)?;
            }

            for_each_element(out, stride, |e, out_e| {
                let mut s = [0.0; MAX_VARS];
                for i in 0..nu {
                    let k = e * nu + i;
                    let state = &soln[k * nv..(k + 1) * nv];
                    let sctx = SourceContext {
                        time,
                        position: ctx.ploc[k],
                        state,
                        wall_distance: walldist.map(|d| d[k]),
                    };
                    self.source.evaluate(&sctx, &mut s[..nv]);
                    for (o, v) in out_e[i * nv..(i + 1) * nv].iter_mut().zip(&s[..nv]) {
                        *o += v;
                    }
                }
            });
            Ok(Progress::Done)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ActiveBanks, BufferPool};
    use crate::elements::test_support::periodic_set;
    use crate::equations::Advection2D;

    #[derive(Debug)]
    struct TimeSource;

    impl SourceTerm for TimeSource {
        fn name(&self) -> &'static str {
            "time"
        }

        fn evaluate(&self, ctx: &SourceContext<'_>, out: &mut [f64]) {
            out[0] = ctx.time + ctx.state[0];
        }
    }

    #[test]
    fn test_combined_source_sums_terms() {
        let combined = CombinedSource::new(vec![Arc::new(BodyForce::new(vec![1.0]))])
            .with(Arc::new(BodyForce::new(vec![0.5])));
        assert_eq!(combined.len(), 2);
        assert!(!combined.needs_wall_distance());

        let ctx = SourceContext {
            time: 0.0,
            position: (0.0, 0.0),
            state: &[3.0],
            wall_distance: None,
        };
        let mut out = [7.0];
        combined.evaluate(&ctx, &mut out);
        assert!((out[0] - 1.5).abs() < 1e-14);

        let damped = combined.with(Arc::new(WallSponge::new(vec![0.0], 1.0, 1.0)));
        assert!(damped.needs_wall_distance());
    }

    #[test]
    fn test_source_kernel_accumulates_into_output() {
        let mut pool = BufferPool::new();
        let (_, set) = periodic_set(1, 2, 1, Arc::new(Advection2D::new(1.0, 0.0)), &mut pool);
        let copy = pool.allocate("soln_copy", [set.neles(), set.ctx.points.n_upts(), 1], 1);
        pool.bank_mut(copy, 0).unwrap().fill(2.0);
        pool.bank_mut(set.buffers.scal_upts, 1).unwrap().fill(-1.0);

        let kernel = SourceKernel::new(
            &set.ctx,
            Arc::new(TimeSource),
            copy.plain(),
            None,
            set.buffers.scal_upts.output(),
        );
        let mut mem = pool.memory(ActiveBanks::new(0, 1));
        kernel.run(&mut mem, &LaunchArgs::at(0.5)).unwrap();

        let out = mem.read(set.buffers.scal_upts.output()).unwrap();
        assert!(out.iter().all(|v| (v - 1.5).abs() < 1e-14));
    }
}
