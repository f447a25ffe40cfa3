use std::cell::RefCell;
use std::future::Future;

/// A speculative mutation that can be undone.
///
/// `begin` snapshots the cell and applies the mutation; the caller then
/// either `commit`s (the snapshot is dropped) or `rollback`s (the snapshot is
/// written back verbatim). A transaction dropped without either, such as
/// one owned by a cancelled future, rolls back.
#[must_use = "an optimistic update must be committed or rolled back"]
pub struct Optimistic<'a, T: Clone> {
    cell: &'a RefCell<T>,
    snapshot: Option<T>,
}

impl<'a, T: Clone> Optimistic<'a, T> {
    pub fn begin(cell: &'a RefCell<T>, mutate: impl FnOnce(&mut T)) -> Self {
        let mut value = cell.borrow_mut();
        let snapshot = (*value).clone();
        mutate(&mut *value);
        Self { cell, snapshot: Some(snapshot) }
    }

    pub fn commit(mut self) {
        self.snapshot = None;
    }

    pub fn rollback(self) {}
}

impl<T: Clone> Drop for Optimistic<'_, T> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.cell.borrow_mut() = snapshot;
        }
    }
}

/// Runs `request` between a speculative `mutate` and its commit or rollback.
pub async fn apply<T, R, E, Fut>(
    cell: &RefCell<T>,
    mutate: impl FnOnce(&mut T),
    request: Fut,
) -> Result<R, E>
where
    T: Clone,
    Fut: Future<Output = Result<R, E>>,
{
    let tx = Optimistic::begin(cell, mutate);
    let res = request.await;
    match &res {
        Ok(_) => tx.commit(),
        Err(_) => tx.rollback(),
    }
    res
}
