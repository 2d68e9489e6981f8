use std::cell::RefCell;

use super::{DeviceError, RenderBackend};

thread_local! {
    static CURRENT: RefCell<Option<Box<dyn RenderBackend>>> = const { RefCell::new(None) };
}

/// Makes `backend` the render context of the calling thread.
///
/// Returns the backend that was current before, if any. Resources created
/// against the previous backend must not outlive it.
pub fn make_current(
    backend: Box<dyn RenderBackend>,
) -> Result<Option<Box<dyn RenderBackend>>, DeviceError> {
    CURRENT
        .try_with(|cell| {
            let mut slot = cell.try_borrow_mut().map_err(|_| DeviceError::ContextBusy)?;
            Ok(slot.replace(backend))
        })
        .unwrap_or(Err(DeviceError::NoContext))
}

/// Detaches and returns the current render context.
pub fn release_current() -> Option<Box<dyn RenderBackend>> {
    CURRENT
        .try_with(|cell| match cell.try_borrow_mut() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                log::warn!("cannot release the render context while it is in use");
                None
            }
        })
        .ok()
        .flatten()
}

/// Returns `true` when a render context is current on this thread.
pub fn is_current() -> bool {
    CURRENT
        .try_with(|cell| cell.try_borrow().map(|slot| slot.is_some()).unwrap_or(true))
        .unwrap_or(false)
}

/// Runs `f` against the current backend.
///
/// Safe to call from `Drop` impls during thread teardown; the thread-local may
/// already be gone, which reads as [`DeviceError::NoContext`].
pub(crate) fn with<R>(f: impl FnOnce(&mut dyn RenderBackend) -> R) -> Result<R, DeviceError> {
    CURRENT
        .try_with(|cell| {
            let mut slot = cell.try_borrow_mut().map_err(|_| DeviceError::ContextBusy)?;
            let backend = slot.as_deref_mut().ok_or(DeviceError::NoContext)?;
            Ok(f(backend))
        })
        .unwrap_or(Err(DeviceError::NoContext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessBackend;

    #[test]
    fn with_fails_without_context() {
        // Test threads start with an empty thread-local.
        assert!(!is_current());
        assert_eq!(with(|_| ()), Err(DeviceError::NoContext));
    }

    #[test]
    fn make_current_replaces_previous() {
        let first = make_current(Box::new(HeadlessBackend::new()));
        assert!(matches!(first, Ok(None)));
        assert!(is_current());

        let second = make_current(Box::new(HeadlessBackend::new()));
        assert!(matches!(second, Ok(Some(_))));

        assert!(release_current().is_some());
        assert!(!is_current());
        assert!(release_current().is_none());
    }

    #[test]
    fn nested_access_reports_busy() {
        let _ = make_current(Box::new(HeadlessBackend::new()));
        let inner = with(|_| with(|_| ()));
        assert_eq!(inner, Ok(Err(DeviceError::ContextBusy)));
        release_current();
    }
}
