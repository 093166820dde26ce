use std::{
    hash::{Hash, Hasher},
    sync::{Arc, Weak},
};

/// Non-owning reference compared by the address of its target.
///
/// Two [`WeakRefId`] are equal if and only if they point at the same allocation,
/// regardless of whether that allocation is still alive.
pub struct WeakRefId<U: ?Sized> {
    inner: Weak<U>,
}

impl<U: ?Sized> WeakRefId<U> {
    pub fn new(inner: Weak<U>) -> Self {
        Self { inner }
    }

    pub fn from_arc(arc: &Arc<U>) -> Self {
        Self {
            inner: Arc::downgrade(arc),
        }
    }

    pub fn upgrade(&self) -> Option<Arc<U>> {
        self.inner.upgrade()
    }

    pub fn as_weak(&self) -> &Weak<U> {
        &self.inner
    }

    /// Returns `true` if `other` is the allocation this reference points at.
    pub fn is<T: ?Sized>(&self, other: &Arc<T>) -> bool {
        std::ptr::eq(self.addr(), Arc::as_ptr(other).cast::<()>())
    }

    fn addr(&self) -> *const () {
        Weak::as_ptr(&self.inner).cast::<()>()
    }
}

impl<U: ?Sized> Clone for WeakRefId<U> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<U: ?Sized> PartialEq for WeakRefId<U> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }
}

impl<U: ?Sized> Eq for WeakRefId<U> {}

impl<U: ?Sized> PartialOrd for WeakRefId<U> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<U: ?Sized> Ord for WeakRefId<U> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.addr().cmp(&other.addr())
    }
}

impl<U: ?Sized> Hash for WeakRefId<U> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_follows_the_allocation() {
        let a = Arc::new(1u32);
        let b = Arc::new(1u32);

        let ra = WeakRefId::from_arc(&a);
        assert!(ra.is(&a));
        assert!(!ra.is(&b));
        assert!(ra == WeakRefId::new(Arc::downgrade(&a)));
        assert!(ra != WeakRefId::from_arc(&b));
    }

    #[test]
    fn dropped_target_keeps_identity_but_cannot_upgrade() {
        let a = Arc::new(String::from("owner"));
        let ra = WeakRefId::from_arc(&a);
        let rb = ra.clone();
        drop(a);

        assert!(ra.upgrade().is_none());
        assert!(ra == rb);
    }
}
