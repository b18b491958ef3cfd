//! Navigation cursor contract shared by table, list, and index (spec 4.7).
//! No direct teacher equivalent; grounded on the teacher's `TableIter`
//! (`ExactSizeIterator`/`FusedIterator`) idiom, generalized into a trait so
//! table/list/index can each hold their own position but share the same
//! `top`/`bottom`/`skip`/`goto` contract instead of three duplicated
//! implementations.

use crate::error::{Flow, Result, XbaseError};
use crate::table::RecordView;

/// A `current` position in `[-1, len]`: `-1` is "before first", `len` is
/// "after last". Implementors own the underlying collection; this trait
/// only owns the position arithmetic.
pub trait Cursor {
    fn len(&self) -> usize;
    fn current(&self) -> i64;
    fn set_current(&mut self, value: i64);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move to the before-first sentinel.
    fn top(&mut self) {
        self.set_current(-1);
    }

    /// Move to the after-last sentinel.
    fn bottom(&mut self) {
        self.set_current(self.len() as i64);
    }

    fn is_before_first(&self) -> bool {
        self.current() < 0
    }

    fn is_after_last(&self) -> bool {
        self.current() >= self.len() as i64
    }

    /// Advance (or retreat, if negative) by `n` positions. Moving past
    /// either sentinel is a [`Flow`] value, not a fatal error.
    fn skip(&mut self, n: i64) -> std::result::Result<(), Flow> {
        let next = self.current() + n;
        if next < -1 {
            return Err(Flow::BeginOfFile);
        }
        if next > self.len() as i64 {
            return Err(Flow::EndOfFile);
        }
        self.set_current(next);
        Ok(())
    }

    /// Jump to an absolute position. Negative indices count from the end,
    /// as with `Table` indexing. Out-of-range is a fatal index error, not a
    /// [`Flow`] value, matching spec 4.7's "out-of-range raises index error".
    fn goto(&mut self, i: i64) -> Result<()> {
        let len = self.len() as i64;
        let normalized = if i < 0 { len + i } else { i };
        if normalized < 0 || normalized >= len {
            return Err(XbaseError::RecordIndexOutOfRange { index: i, len: self.len() });
        }
        self.set_current(normalized);
        Ok(())
    }
}

/// Read access over the cursor's neighborhood (spec 4.7): `current_record`,
/// `prev_record`, `next_record`. A position with no record behind it -- a
/// sentinel, or a read that hits a fatal error -- yields
/// [`RecordView::Vapor`] rather than propagating, so a caller can loop until
/// the record is falsy instead of matching on a `Result`.
pub trait RecordCursor: Cursor {
    /// Decode the record at `index`, which the default methods only ever
    /// call with an in-range position.
    fn read_record(&mut self, index: i64) -> Result<RecordView>;

    fn current_record(&mut self) -> RecordView {
        if self.is_before_first() || self.is_after_last() {
            return RecordView::vapor();
        }
        self.read_record(self.current()).unwrap_or(RecordView::Vapor)
    }

    fn prev_record(&mut self) -> RecordView {
        let index = self.current() - 1;
        if index < 0 {
            return RecordView::vapor();
        }
        self.read_record(index).unwrap_or(RecordView::Vapor)
    }

    fn next_record(&mut self) -> RecordView {
        let index = self.current() + 1;
        if index >= self.len() as i64 {
            return RecordView::vapor();
        }
        self.read_record(index).unwrap_or(RecordView::Vapor)
    }
}
