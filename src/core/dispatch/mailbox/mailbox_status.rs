use std::fmt::{Display, Formatter};

/// Snapshot of a mailbox's packed status word.
///
/// bit 0 is `CLOSED`, bit 1 is `SCHEDULED`, and the remaining bits count nested suspensions in units of
/// `SUSPEND_UNIT`. Once `CLOSED` is set no other bit survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxStatus(u32);

impl MailboxStatus {
  pub const OPEN: u32 = 0;
  pub const CLOSED: u32 = 1;
  pub const SCHEDULED: u32 = 2;
  pub const SHOULD_SCHEDULE_MASK: u32 = 3;
  pub const SHOULD_NOT_PROCESS_MASK: u32 = !2;
  pub const SUSPEND_MASK: u32 = !3;
  pub const SUSPEND_UNIT: u32 = 4;

  pub fn from_bits(bits: u32) -> Self {
    Self(bits)
  }

  pub fn bits(&self) -> u32 {
    self.0
  }

  pub fn is_closed(&self) -> bool {
    self.0 & Self::CLOSED != 0
  }

  pub fn is_scheduled(&self) -> bool {
    self.0 & Self::SCHEDULED != 0
  }

  pub fn is_suspended(&self) -> bool {
    self.0 & Self::SUSPEND_MASK != 0
  }

  /// Open and not suspended. The scheduled bit is irrelevant here.
  pub fn should_process_message(&self) -> bool {
    self.0 & Self::SHOULD_NOT_PROCESS_MASK == 0
  }

  pub fn suspend_count(&self) -> u32 {
    self.0 / Self::SUSPEND_UNIT
  }
}

impl Display for MailboxStatus {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    if self.is_closed() {
      write!(f, "Closed")
    } else {
      write!(
        f,
        "Open(suspend_count = {}, scheduled = {})",
        self.suspend_count(),
        self.is_scheduled()
      )
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_predicates() {
    let open = MailboxStatus::from_bits(MailboxStatus::OPEN);
    assert!(open.should_process_message());
    assert!(!open.is_closed() && !open.is_scheduled() && !open.is_suspended());

    let scheduled = MailboxStatus::from_bits(MailboxStatus::SCHEDULED);
    assert!(scheduled.is_scheduled());
    assert!(scheduled.should_process_message());

    let suspended_twice = MailboxStatus::from_bits(2 * MailboxStatus::SUSPEND_UNIT | MailboxStatus::SCHEDULED);
    assert!(suspended_twice.is_suspended());
    assert!(suspended_twice.is_scheduled());
    assert!(!suspended_twice.should_process_message());
    assert_eq!(suspended_twice.suspend_count(), 2);

    let closed = MailboxStatus::from_bits(MailboxStatus::CLOSED);
    assert!(closed.is_closed());
    assert!(!closed.should_process_message());
    assert_eq!(closed.to_string(), "Closed");
  }
}
