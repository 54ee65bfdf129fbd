//! Small utility helpers used across modules.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    s.to_string()
  } else {
    let cut = s.char_indices().take_while(|(i, _)| *i < max).last().map(|(i, c)| i + c.len_utf8()).unwrap_or(0);
    format!("{}… ({} bytes total)", &s[..cut], s.len())
  }
}

/// Scoped in-flight lock. Mirrors the "disable the trigger while a request is
/// outstanding" rule: acquire before the call, release on drop on every path.
#[derive(Clone, Default)]
pub struct UiLock(Arc<AtomicBool>);

pub struct UiLockGuard(Arc<AtomicBool>);

impl UiLock {
  pub fn new() -> Self {
    Self::default()
  }

  /// Acquire the lock, or None if a request of this kind is already in flight.
  pub fn try_acquire(&self) -> Option<UiLockGuard> {
    self
      .0
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| UiLockGuard(self.0.clone()))
  }

  pub fn locked(&self) -> bool {
    self.0.load(Ordering::Acquire)
  }
}

impl Drop for UiLockGuard {
  fn drop(&mut self) {
    self.0.store(false, Ordering::Release);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fill_template_replaces_all_pairs() {
    let out = fill_template("{a} and {b} and {a}", &[("a", "x"), ("b", "y")]);
    assert_eq!(out, "x and y and x");
  }

  #[test]
  fn ui_lock_is_exclusive_and_released_on_drop() {
    let lock = UiLock::new();
    let guard = lock.try_acquire();
    assert!(guard.is_some());
    assert!(lock.try_acquire().is_none());
    assert!(lock.locked());
    drop(guard);
    assert!(!lock.locked());
    assert!(lock.try_acquire().is_some());
  }
}
