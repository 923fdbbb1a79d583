pub mod any_message;
pub mod dead_letters;
pub mod dispatcher;
pub mod dispatchers;
pub mod envelope;
pub mod executor;
pub mod mailbox;
pub mod mailboxes;
pub mod message_queue;
pub mod system_message;
