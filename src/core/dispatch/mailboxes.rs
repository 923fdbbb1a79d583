use crate::core::dispatch::dead_letters::DeadLetters;
use crate::core::dispatch::mailbox::mailbox_type::MailboxType;
use dashmap::DashMap;
use std::sync::Arc;

/// Mailbox configuration of an actor system: the shared dead-letter sink, the default mailbox type and
/// named mailbox types.
#[derive(Debug, Clone)]
pub struct Mailboxes {
  dead_letters: DeadLetters,
  default_mailbox_type: MailboxType,
  mailbox_types: Arc<DashMap<String, MailboxType>>,
}

impl Mailboxes {
  pub fn new(default_mailbox_type: MailboxType, dead_letters: DeadLetters) -> Self {
    Self {
      dead_letters,
      default_mailbox_type,
      mailbox_types: Arc::new(DashMap::new()),
    }
  }

  pub fn dead_letters(&self) -> &DeadLetters {
    &self.dead_letters
  }

  pub fn default_mailbox_type(&self) -> &MailboxType {
    &self.default_mailbox_type
  }

  pub fn register(&self, id: &str, mailbox_type: MailboxType) {
    log::debug!("Registering mailbox [{}]: {:?}", id, mailbox_type);
    self.mailbox_types.insert(id.to_owned(), mailbox_type);
  }

  pub fn lookup(&self, id: &str) -> Option<MailboxType> {
    self.mailbox_types.get(id).map(|entry| entry.value().clone())
  }
}
