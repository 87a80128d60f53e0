//! Named buffers, banks and kernel-side memory access.
//!
//! Every buffer has a `[neles, npts, nvars]` shape stored element-major with
//! interleaved variables: `data[(e * npts + i) * nvars + v]`. A buffer may
//! own several banks; kernels reach a banked buffer through a [`BankRole`]
//! and the [`ActiveBanks`] of the current call decide which storage that is.

use super::error::KernelError;

/// Handle of a buffer inside a [`BufferPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(usize);

impl BufferId {
    /// Bind bank 0 (the only bank of a plain buffer).
    pub fn plain(self) -> Binding {
        Binding::Plain(self)
    }

    /// Bind whichever bank is active for input.
    pub fn input(self) -> Binding {
        Binding::Banked(self, BankRole::Input)
    }

    /// Bind whichever bank is active for output.
    pub fn output(self) -> Binding {
        Binding::Banked(self, BankRole::Output)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Which active bank a banked binding resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BankRole {
    Input,
    Output,
}

/// Active bank selection for one residual evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActiveBanks {
    pub input: usize,
    pub output: usize,
}

impl ActiveBanks {
    pub fn new(input: usize, output: usize) -> Self {
        Self { input, output }
    }
}

/// How a kernel refers to a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Binding {
    Plain(BufferId),
    Banked(BufferId, BankRole),
}

impl Binding {
    pub fn id(self) -> BufferId {
        match self {
            Binding::Plain(id) | Binding::Banked(id, _) => id,
        }
    }
}

/// A named numeric store with one or more banks.
#[derive(Clone, Debug)]
pub struct Buffer {
    name: String,
    shape: [usize; 3],
    banks: Vec<Vec<f64>>,
}

impl Buffer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Values per bank.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn nbanks(&self) -> usize {
        self.banks.len()
    }
}

/// Owner of every buffer of one discretization.
#[derive(Clone, Debug, Default)]
pub struct BufferPool {
    buffers: Vec<Buffer>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a zero-filled buffer with `nbanks` banks (at least one).
    pub fn allocate(&mut self, name: impl Into<String>, shape: [usize; 3], nbanks: usize) -> BufferId {
        let len = shape.iter().product();
        let id = BufferId(self.buffers.len());
        self.buffers.push(Buffer {
            name: name.into(),
            shape,
            banks: vec![vec![0.0; len]; nbanks.max(1)],
        });
        id
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn buffer(&self, id: BufferId) -> Result<&Buffer, KernelError> {
        self.buffers.get(id.0).ok_or(KernelError::UnknownBuffer(id.0))
    }

    /// Look a buffer up by name.
    pub fn find(&self, name: &str) -> Option<BufferId> {
        self.buffers.iter().position(|b| b.name == name).map(BufferId)
    }

    pub fn bank(&self, id: BufferId, bank: usize) -> Result<&[f64], KernelError> {
        let buf = self.buffer(id)?;
        buf.banks
            .get(bank)
            .map(Vec::as_slice)
            .ok_or_else(|| bank_error(buf, bank))
    }

    pub fn bank_mut(&mut self, id: BufferId, bank: usize) -> Result<&mut [f64], KernelError> {
        let buf = self
            .buffers
            .get_mut(id.0)
            .ok_or(KernelError::UnknownBuffer(id.0))?;
        if bank >= buf.banks.len() {
            return Err(bank_error(buf, bank));
        }
        Ok(&mut buf.banks[bank])
    }

    /// Memory view handed to kernels for one residual evaluation.
    pub fn memory(&mut self, banks: ActiveBanks) -> KernelMemory<'_> {
        KernelMemory { pool: self, banks }
    }

    fn resolve(&self, binding: Binding, banks: ActiveBanks) -> Result<(BufferId, usize), KernelError> {
        let (id, bank) = match binding {
            Binding::Plain(id) => (id, 0),
            Binding::Banked(id, BankRole::Input) => (id, banks.input),
            Binding::Banked(id, BankRole::Output) => (id, banks.output),
        };
        let buf = self.buffer(id)?;
        if bank >= buf.banks.len() {
            return Err(bank_error(buf, bank));
        }
        Ok((id, bank))
    }
}

fn bank_error(buf: &Buffer, bank: usize) -> KernelError {
    KernelError::BankOutOfRange {
        buffer: buf.name.clone(),
        bank,
        nbanks: buf.banks.len(),
    }
}

/// Buffer access for kernels during one residual evaluation.
///
/// Outputs are checked out for the duration of a closure; everything else
/// is reachable read-only through [`Inputs`].
pub struct KernelMemory<'a> {
    pool: &'a mut BufferPool,
    banks: ActiveBanks,
}

impl KernelMemory<'_> {
    pub fn banks(&self) -> ActiveBanks {
        self.banks
    }

    pub fn read(&self, binding: Binding) -> Result<&[f64], KernelError> {
        let (id, bank) = self.pool.resolve(binding, self.banks)?;
        self.pool.bank(id, bank)
    }

    pub fn write(&mut self, binding: Binding) -> Result<&mut [f64], KernelError> {
        let (id, bank) = self.pool.resolve(binding, self.banks)?;
        self.pool.bank_mut(id, bank)
    }

    /// Run `f` with one output checked out and every other buffer readable.
    pub fn with_output<R>(
        &mut self,
        out: Binding,
        f: impl FnOnce(&mut [f64], &Inputs<'_>) -> Result<R, KernelError>,
    ) -> Result<R, KernelError> {
        self.with_outputs([out], |[o], inputs| f(o, inputs))
    }

    /// Run `f` with `N` distinct outputs checked out.
    pub fn with_outputs<const N: usize, R>(
        &mut self,
        outs: [Binding; N],
        f: impl FnOnce([&mut [f64]; N], &Inputs<'_>) -> Result<R, KernelError>,
    ) -> Result<R, KernelError> {
        let mut keys = [(BufferId(0), 0); N];
        for (key, binding) in keys.iter_mut().zip(outs) {
            *key = self.pool.resolve(binding, self.banks)?;
        }
        for a in 0..N {
            if keys[a + 1..].contains(&keys[a]) {
                return Err(KernelError::Aliased(self.pool.buffer(keys[a].0)?.name.clone()));
            }
        }

        let mut taken: [Vec<f64>; N] =
            keys.map(|(id, bank)| std::mem::take(&mut self.pool.buffers[id.0].banks[bank]));
        let result = {
            let inputs = Inputs {
                pool: &*self.pool,
                banks: self.banks,
                checked_out: &keys,
            };
            f(taken.each_mut().map(|v| v.as_mut_slice()), &inputs)
        };
        for ((id, bank), data) in keys.into_iter().zip(taken) {
            self.pool.buffers[id.0].banks[bank] = data;
        }
        result
    }
}

/// Read-only access to every buffer not currently checked out.
pub struct Inputs<'a> {
    pool: &'a BufferPool,
    banks: ActiveBanks,
    checked_out: &'a [(BufferId, usize)],
}

impl Inputs<'_> {
    pub fn read(&self, binding: Binding) -> Result<&[f64], KernelError> {
        let key = self.pool.resolve(binding, self.banks)?;
        if self.checked_out.contains(&key) {
            return Err(KernelError::Aliased(self.pool.buffer(key.0)?.name.clone()));
        }
        self.pool.bank(key.0, key.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_resolution() {
        let mut pool = BufferPool::new();
        let u = pool.allocate("u", [2, 3, 1], 3);
        pool.bank_mut(u, 2).unwrap().fill(7.0);

        let mut mem = pool.memory(ActiveBanks::new(2, 0));
        assert!(mem.read(u.input()).unwrap().iter().all(|&v| v == 7.0));
        assert!(mem.read(u.output()).unwrap().iter().all(|&v| v == 0.0));
        mem.write(u.output()).unwrap()[0] = 1.0;
        assert_eq!(pool.bank(u, 0).unwrap()[0], 1.0);
    }

    #[test]
    fn test_out_of_range_bank() {
        let mut pool = BufferPool::new();
        let u = pool.allocate("u", [1, 1, 1], 2);
        let mem = pool.memory(ActiveBanks::new(5, 0));
        assert!(matches!(
            mem.read(u.input()),
            Err(KernelError::BankOutOfRange { bank: 5, nbanks: 2, .. })
        ));
    }

    #[test]
    fn test_with_output_restores_and_detects_aliasing() {
        let mut pool = BufferPool::new();
        let a = pool.allocate("a", [1, 2, 1], 1);
        let b = pool.allocate("b", [1, 2, 1], 1);
        pool.bank_mut(a, 0).unwrap().copy_from_slice(&[1.0, 2.0]);

        let mut mem = pool.memory(ActiveBanks::default());
        mem.with_output(b.plain(), |out, inputs| {
            let src = inputs.read(a.plain())?;
            out[0] = src[0] + src[1];
            Ok(())
        })
        .unwrap();

        let err = mem
            .with_output(a.plain(), |_, inputs| inputs.read(a.plain()).map(|_| ()))
            .unwrap_err();
        assert_eq!(err, KernelError::Aliased("a".into()));
        // Checked-out storage is put back even when the kernel fails
        assert_eq!(mem.read(a.plain()).unwrap(), &[1.0, 2.0]);
        assert_eq!(mem.read(b.plain()).unwrap()[0], 3.0);
    }

    #[test]
    fn test_duplicate_outputs_rejected() {
        let mut pool = BufferPool::new();
        let u = pool.allocate("u", [1, 1, 1], 2);
        let mut mem = pool.memory(ActiveBanks::new(1, 1));
        let err = mem
            .with_outputs([u.input(), u.output()], |_, _| Ok(()))
            .unwrap_err();
        assert_eq!(err, KernelError::Aliased("u".into()));
    }
}
