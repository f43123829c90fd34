//! Where the coordinator reads the live viewport size from.

use std::cell::Cell;
use std::rc::Rc;

use pz_core::Size;

/// Layout collaborator queried at the time of every event, since the
/// viewport can be resized independently of any input.
pub trait ViewportSource {
    fn viewport_size(&self) -> Size;
}

/// A viewport that never changes.
impl ViewportSource for Size {
    fn viewport_size(&self) -> Size {
        *self
    }
}

/// A viewport the owner resizes in place.
impl ViewportSource for Cell<Size> {
    fn viewport_size(&self) -> Size {
        self.get()
    }
}

impl<T: ViewportSource + ?Sized> ViewportSource for &T {
    fn viewport_size(&self) -> Size {
        (**self).viewport_size()
    }
}

impl<T: ViewportSource + ?Sized> ViewportSource for Rc<T> {
    fn viewport_size(&self) -> Size {
        (**self).viewport_size()
    }
}
