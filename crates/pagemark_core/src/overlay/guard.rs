//! Scoped ownership of overlay instances.

use crate::overlay::OverlayEngine;
use std::ops::{Deref, DerefMut};

/// Owns one overlay instance and destroys it when dropped.
///
/// Every exit from a page state (teardown, failed attach, session drop)
/// releases overlay listeners through this guard.
pub struct OverlayGuard<O: OverlayEngine + ?Sized> {
    inner: Box<O>,
}

impl<O: OverlayEngine + ?Sized> OverlayGuard<O> {
    pub fn new(inner: Box<O>) -> Self {
        Self { inner }
    }
}

impl<O: OverlayEngine + ?Sized> Deref for OverlayGuard<O> {
    type Target = O;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<O: OverlayEngine + ?Sized> DerefMut for OverlayGuard<O> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<O: OverlayEngine + ?Sized> Drop for OverlayGuard<O> {
    fn drop(&mut self) {
        self.inner.destroy();
    }
}
