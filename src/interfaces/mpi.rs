//! Faces on a partition boundary.
//!
//! For each neighbouring partition the shared faces are listed in the same
//! order on both sides (sorted by global edge), so face k of the local
//! list and face k of the peer's list coincide. Exchanging face values is
//! four kernels:
//!
//! 1. `scal_fpts_pack`: face buffer → send staging
//! 2. `scal_fpts_send`: post the send staging to the peer (non-blocking)
//! 3. `scal_fpts_recv`: peer message → recv staging (pending until it arrives)
//! 4. `scal_fpts_unpack`: recv staging → remote view
//!
//! after which `comm_flux` pairs local point m with point p-m of the remote
//! view, exactly as interior faces do.

use super::fpt_slot;
use crate::backend::{
    Binding, BufferId, BufferPool, Kernel, KernelError, KernelGroup, KernelMemory, KernelTable,
    LaunchArgs, Progress,
};
use crate::comm::{HaloEndpoint, HaloLink};
use crate::elements::{ElementSet, check_len};
use crate::equations::{FluxModel, MAX_VARS};
use crate::flux::{FaceFlux, RiemannSolver};
use crate::mesh::PartitionMesh;
use crate::solver::{SetupError, slots};
use std::sync::Arc;
use tracing::{debug, trace};

/// Faces shared with one neighbouring partition.
#[derive(Clone, Debug)]
pub struct MpiInterface {
    pub peer: usize,
    /// Local face-point slot per (face k, point m), `[nfaces * (p+1)]`
    pub slots: Arc<Vec<usize>>,
    /// Outward unit normal per shared face
    pub normals: Arc<Vec<(f64, f64)>>,
    pub send: BufferId,
    pub recv: BufferId,
    pub remote: BufferId,
}

impl MpiInterface {
    pub fn n_faces(&self) -> usize {
        self.normals.len()
    }
}

/// Partition interfaces of one partition, one entry per neighbour.
#[derive(Clone, Debug, Default)]
pub struct MpiInterfaces {
    links: Vec<MpiInterface>,
}

impl MpiInterfaces {
    pub fn new(part: &PartitionMesh, elements: &ElementSet, pool: &mut BufferPool) -> Self {
        let ctx = &*elements.ctx;
        let n = ctx.points.n_1d;
        let links = part
            .neighbor_ranks()
            .into_iter()
            .map(|peer| {
                let faces: Vec<_> = part.remote_faces(peer).collect();
                let slots = faces
                    .iter()
                    .flat_map(|rf| (0..n).map(move |m| (rf.face, m)))
                    .map(|(f, m)| fpt_slot(ctx, f.element, f.face, m))
                    .collect();
                let normals = faces
                    .iter()
                    .map(|rf| ctx.metrics[rf.face.element].normals[rf.face.face])
                    .collect();
                let shape = [faces.len(), n, ctx.nvars];
                debug!(rank = part.rank, peer, nfaces = faces.len(), "partition interface");
                MpiInterface {
                    peer,
                    slots: Arc::new(slots),
                    normals: Arc::new(normals),
                    send: pool.allocate(format!("mpi_send_{peer}"), shape, 1),
                    recv: pool.allocate(format!("mpi_recv_{peer}"), shape, 1),
                    remote: pool.allocate(format!("mpi_remote_{peer}"), shape, 1),
                }
            })
            .collect();
        Self { links }
    }

    pub fn links(&self) -> &[MpiInterface] {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Register the exchange and flux kernels, one per neighbour and slot.
    pub fn register_kernels(
        &self,
        table: &mut KernelTable,
        elements: &ElementSet,
        endpoint: &HaloEndpoint,
        rs: RiemannSolver,
    ) -> Result<(), SetupError> {
        let fpts = elements.buffers.scal_fpts.plain();
        let fpts_len = elements.ctx.neles * elements.ctx.fpts_stride();
        let model = &elements.ctx.model;
        let group = KernelGroup::MpiInterfaces;

        for iface in &self.links {
            let link = endpoint
                .link(iface.peer)
                .cloned()
                .ok_or(SetupError::MissingHaloLink {
                    rank: endpoint.rank(),
                    peer: iface.peer,
                })?;
            let nv = elements.ctx.nvars;

            table.register(
                group,
                slots::SCAL_FPTS_PACK,
                Arc::new(Pack {
                    slots: Arc::clone(&iface.slots),
                    nv,
                    fpts,
                    fpts_len,
                    send: iface.send.plain(),
                }),
            );
            table.register(
                group,
                slots::SCAL_FPTS_SEND,
                Arc::new(Send {
                    link: link.clone(),
                    send: iface.send.plain(),
                }),
            );
            table.register(
                group,
                slots::SCAL_FPTS_RECV,
                Arc::new(Recv {
                    link,
                    recv: iface.recv.plain(),
                }),
            );
            table.register(
                group,
                slots::SCAL_FPTS_UNPACK,
                Arc::new(Unpack {
                    recv: iface.recv.plain(),
                    remote: iface.remote.plain(),
                }),
            );
            for (name, flux) in [
                (slots::COMM_FLUX, FaceFlux::Upwind(rs)),
                (slots::COMM_FLUX_CENTERED, FaceFlux::Centered),
            ] {
                table.register(
                    group,
                    name,
                    Arc::new(MpiFlux {
                        name,
                        model: Arc::clone(model),
                        flux,
                        iface: iface.clone(),
                        n_1d: elements.ctx.points.n_1d,
                        fpts,
                        fpts_len,
                    }),
                );
            }
        }
        Ok(())
    }
}

/// Gathers the shared face points into the send staging buffer.
pub struct Pack {
    slots: Arc<Vec<usize>>,
    nv: usize,
    fpts: Binding,
    fpts_len: usize,
    send: Binding,
}

impl Kernel for Pack {
    fn name(&self) -> &str {
        "scal_fpts_pack"
    }

    fn run(&self, mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<Progress, KernelError> {
        let nv = self.nv;
        mem.with_output(self.send, |send, inputs| {
            let fpts = inputs.read(self.fpts)?;
            check_len("scal_fpts", fpts, self.fpts_len)?;
            check_len("mpi_send", send, self.slots.len() * nv)?;
            for (dst, &slot) in send.chunks_exact_mut(nv).zip(self.slots.iter()) {
                dst.copy_from_slice(&fpts[slot * nv..(slot + 1) * nv]);
            }
            Ok(Progress::Done)
        })
    }
}

/// Posts the send staging buffer to the peer.
pub struct Send {
    link: HaloLink,
    send: Binding,
}

impl Kernel for Send {
    fn name(&self) -> &str {
        "scal_fpts_send"
    }

    fn run(&self, mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<Progress, KernelError> {
        self.link.post(mem.read(self.send)?)?;
        trace!(peer = self.link.peer(), "posted");
        Ok(Progress::Done)
    }
}

/// Receives the peer's face values into the recv staging buffer.
pub struct Recv {
    link: HaloLink,
    recv: Binding,
}

impl Recv {
    fn store(&self, mem: &mut KernelMemory<'_>, msg: &[f64]) -> Result<(), KernelError> {
        let recv = mem.write(self.recv)?;
        check_len("mpi_recv", msg, recv.len())?;
        recv.copy_from_slice(msg);
        Ok(())
    }
}

impl Kernel for Recv {
    fn name(&self) -> &str {
        "scal_fpts_recv"
    }

    fn run(&self, mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<Progress, KernelError> {
        match self.link.try_take()? {
            Some(msg) => {
                self.store(mem, &msg)?;
                Ok(Progress::Done)
            }
            None => Ok(Progress::Pending),
        }
    }

    fn wait(&self, mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<(), KernelError> {
        let msg = self.link.take()?;
        self.store(mem, &msg)
    }
}

/// Copies the recv staging buffer into the remote view.
pub struct Unpack {
    recv: Binding,
    remote: Binding,
}

impl Kernel for Unpack {
    fn name(&self) -> &str {
        "scal_fpts_unpack"
    }

    fn run(&self, mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<Progress, KernelError> {
        mem.with_output(self.remote, |remote, inputs| {
            let recv = inputs.read(self.recv)?;
            check_len("mpi_remote", recv, remote.len())?;
            remote.copy_from_slice(recv);
            Ok(Progress::Done)
        })
    }
}

/// Common flux between local face points and the remote view.
///
/// Only the local side is written; the peer computes its own half with the
/// roles swapped.
pub struct MpiFlux {
    name: &'static str,
    model: Arc<dyn FluxModel>,
    flux: FaceFlux,
    iface: MpiInterface,
    n_1d: usize,
    fpts: Binding,
    fpts_len: usize,
}

impl Kernel for MpiFlux {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, mem: &mut KernelMemory<'_>, _args: &LaunchArgs) -> Result<Progress, KernelError> {
        let nv = self.model.n_vars();
        let n = self.n_1d;
        mem.with_output(self.fpts, |fpts, inputs| {
            let remote = inputs.read(self.iface.remote.plain())?;
            check_len("scal_fpts", fpts, self.fpts_len)?;
            check_len("mpi_remote", remote, self.iface.slots.len() * nv)?;

            let mut f = [0.0; MAX_VARS];
            for (k, &normal) in self.iface.normals.iter().enumerate() {
                for m in 0..n {
                    let at = self.iface.slots[k * n + m] * nv;
                    let r = (k * n + (n - 1 - m)) * nv;
                    self.flux.flux(
                        self.model.as_ref(),
                        &fpts[at..at + nv],
                        &remote[r..r + nv],
                        normal,
                        &mut f[..nv],
                    );
                    fpts[at..at + nv].copy_from_slice(&f[..nv]);
                }
            }
            Ok(Progress::Done)
        })
    }
}
