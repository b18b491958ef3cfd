//! Flux-scoped transaction helper: automatic per-record commit/rollback
//! over an iterable of record indices (spec 4.10). Grounded on `record.rs`'s
//! `Flux` plus the teacher's `TableIter` iteration idiom, generalized from a
//! plain iterator into one with commit-on-success/rollback-on-error
//! semantics around each yielded record.

use crate::error::Result;
use crate::record::Flux;
use crate::table::{OpenMode, Table};

/// Run `body` once per index in `indices`, each inside its own flux scope:
/// the record's shadow buffer is committed if `body` returns `Ok`, rolled
/// back if it returns `Err` (and the error is then propagated). If `table`
/// is closed on entry, it is opened read-write for the duration and closed
/// again before returning.
pub fn for_each_in_flux(
    table: &mut Table,
    indices: impl IntoIterator<Item = i64>,
    mut body: impl FnMut(&mut Flux) -> Result<()>,
) -> Result<()> {
    let reopened = if table.is_closed() {
        *table = Table::open(table.path(), OpenMode::ReadWrite, table.config())?;
        true
    } else {
        false
    };

    let result = run(table, indices, &mut body);

    if reopened {
        table.close()?;
    }
    result
}

fn run(
    table: &mut Table,
    indices: impl IntoIterator<Item = i64>,
    body: &mut dyn FnMut(&mut Flux) -> Result<()>,
) -> Result<()> {
    for index in indices {
        let mut flux = table.start_flux(index)?;
        match body(&mut flux) {
            Ok(()) => table.commit_flux(index, flux)?,
            Err(e) => {
                table.rollback_flux(index, flux)?;
                return Err(e);
            }
        }
    }
    Ok(())
}
