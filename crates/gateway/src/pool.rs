//! Worker-context pool
//!
//! A fixed set of pre-initialized client contexts, one per slot. Free slots
//! travel through a bounded MPMC channel: a blocking receive both admits the
//! request (capping concurrency at the pool size) and hands it the slot it
//! will use. Returning the slot is a send back into the channel, which can
//! never block because the channel is sized to the pool.
//!
//! The channel is the concurrency proof: a context is reachable only
//! through the slot value, and a slot is held by exactly one task between
//! receive and send.

use crossfire::{MAsyncRx, MAsyncTx, mpmc};

use restin_protocol::{BoxedContext, ClientContext, ContextFactory, TpError};

/// One pool slot: its number and the context it owns
pub struct Slot {
    nr: usize,
    ctx: BoxedContext,
}

/// Bounded pool of worker contexts
pub struct WorkerPool {
    tx: MAsyncTx<Slot>,
    rx: MAsyncRx<Slot>,
    size: usize,
}

impl WorkerPool {
    /// Initialize `size` contexts and fill the free channel
    ///
    /// A context that fails to initialize aborts startup; already created
    /// contexts are dropped.
    pub fn new(size: usize, factory: &dyn ContextFactory) -> Result<Self, TpError> {
        let (tx, rx) = mpmc::bounded_async(size);

        for nr in 0..size {
            let ctx = factory.create()?;
            tx.try_send(Slot { nr, ctx })
                .map_err(|_| TpError::system("free channel refused a fresh slot"))?;
            tracing::debug!(slot = nr, "worker context initialized");
        }

        tracing::info!(workers = size, "worker pool ready");
        Ok(Self { tx, rx, size })
    }

    /// Pool size
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Lease a slot, waiting until one is free
    ///
    /// The returned guard gives exclusive use of the slot's context and
    /// puts the slot back when dropped, including on panic and on client
    /// disconnect.
    pub async fn acquire(&self) -> Result<Lease, TpError> {
        let slot = self
            .rx
            .recv()
            .await
            .map_err(|_| TpError::system("worker pool is shut down"))?;
        tracing::debug!(slot = slot.nr, "worker context leased");
        Ok(Lease {
            slot: Some(slot),
            tx: self.tx.clone(),
        })
    }

    /// Drain every slot and terminate its context
    ///
    /// Each receive blocks until that slot's current request finishes, so
    /// no context is destroyed while leased. Contexts are terminated in
    /// slot order once all are reclaimed.
    pub async fn shutdown(&self) {
        let mut slots = Vec::with_capacity(self.size);
        for _ in 0..self.size {
            match self.rx.recv().await {
                Ok(slot) => {
                    tracing::info!(slot = slot.nr, "worker context reclaimed");
                    slots.push(slot);
                }
                Err(_) => break,
            }
        }

        slots.sort_by_key(|slot| slot.nr);
        for mut slot in slots {
            slot.ctx.terminate().await;
            tracing::info!(slot = slot.nr, "worker context terminated");
        }
    }
}

/// Exclusive lease of one pool slot
pub struct Lease {
    slot: Option<Slot>,
    tx: MAsyncTx<Slot>,
}

impl Lease {
    /// Slot number, for logging
    #[inline]
    pub fn nr(&self) -> usize {
        self.slot.as_ref().map(|slot| slot.nr).unwrap_or_default()
    }

    /// The leased client context
    pub fn context(&mut self) -> &mut dyn ClientContext {
        self.slot
            .as_mut()
            .expect("slot present until drop")
            .ctx
            .as_mut()
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            let nr = slot.nr;
            // Sized channel: a return send cannot find the channel full.
            if self.tx.try_send(slot).is_err() {
                tracing::error!(slot = nr, "free channel rejected a returned slot");
            } else {
                tracing::debug!(slot = nr, "worker context released");
            }
        }
    }
}
