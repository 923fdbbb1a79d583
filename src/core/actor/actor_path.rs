use crate::core::actor::actor_cell::UNDEFINED_UID;
use crate::ActuatorError;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

const VALID_SYMBOLS: &str = "-_.*$+:@&=,!~';";

fn is_valid_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || VALID_SYMBOLS.contains(c)
}

fn is_hex_char(c: char) -> bool {
  c.is_ascii_hexdigit()
}

// Position of the first invalid character, if any. `%` must introduce two hex digits.
fn find_invalid_position(element: &str) -> Option<usize> {
  let chars = element.chars().collect::<Vec<_>>();
  let mut pos = 0;
  while pos < chars.len() {
    match chars[pos] {
      c if is_valid_char(c) => pos += 1,
      '%' if pos + 2 < chars.len() && is_hex_char(chars[pos + 1]) && is_hex_char(chars[pos + 2]) => pos += 3,
      _ => return Some(pos),
    }
  }
  None
}

#[derive(Debug, Clone)]
pub enum ActorPath {
  Root {
    system_name: String,
  },
  Child {
    parent: Arc<ActorPath>,
    name: String,
    uid: u32,
  },
}

impl ActorPath {
  pub fn of_root(system_name: &str) -> Self {
    ActorPath::Root {
      system_name: system_name.to_owned(),
    }
  }

  pub fn of_child(parent: ActorPath, name: &str, uid: u32) -> Self {
    ActorPath::Child {
      parent: Arc::new(parent),
      name: name.to_owned(),
      uid,
    }
  }

  pub fn with_child(&self, name: &str, uid: u32) -> Self {
    Self::of_child(self.clone(), name, uid)
  }

  /// Checks one path element: non-empty, not starting with `$`, only URI-safe characters.
  pub fn validate_path_element(element: &str) -> Result<(), ActuatorError> {
    let invalid = |reason: String| ActuatorError::InvalidActorName {
      element: element.to_owned(),
      reason,
    };
    if element.is_empty() {
      return Err(invalid("path element must not be empty".to_owned()));
    }
    if element.starts_with('$') {
      return Err(invalid("path element must not start with `$`".to_owned()));
    }
    match find_invalid_position(element) {
      Some(pos) => Err(invalid(format!(
        "illegal character at position {}, must contain only ASCII letters, digits, `{}` or %-encoded bytes",
        pos, VALID_SYMBOLS
      ))),
      None => Ok(()),
    }
  }

  pub fn is_root(&self) -> bool {
    matches!(self, ActorPath::Root { .. })
  }

  pub fn name(&self) -> &str {
    match self {
      ActorPath::Root { .. } => "/",
      ActorPath::Child { name, .. } => name,
    }
  }

  pub fn uid(&self) -> u32 {
    match self {
      ActorPath::Root { .. } => UNDEFINED_UID,
      ActorPath::Child { uid, .. } => *uid,
    }
  }

  pub fn parent(&self) -> Option<&ActorPath> {
    match self {
      ActorPath::Root { .. } => None,
      ActorPath::Child { parent, .. } => Some(&**parent),
    }
  }

  pub fn system_name(&self) -> &str {
    match self {
      ActorPath::Root { system_name } => system_name,
      ActorPath::Child { parent, .. } => parent.system_name(),
    }
  }

  pub fn elements(&self) -> Vec<&str> {
    let mut elements = Vec::new();
    let mut current = self;
    while let ActorPath::Child { parent, name, .. } = current {
      elements.push(name.as_str());
      current = &**parent;
    }
    elements.reverse();
    elements
  }

  pub fn to_string_without_uid(&self) -> String {
    format!("actuator://{}/{}", self.system_name(), self.elements().join("/"))
  }
}

impl Display for ActorPath {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let uid = self.uid();
    if uid == UNDEFINED_UID {
      write!(f, "{}", self.to_string_without_uid())
    } else {
      write!(f, "{}#{}", self.to_string_without_uid(), uid)
    }
  }
}

impl PartialEq for ActorPath {
  fn eq(&self, other: &Self) -> bool {
    self.uid() == other.uid() && self.to_string_without_uid() == other.to_string_without_uid()
  }
}

impl Eq for ActorPath {}

impl Hash for ActorPath {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.to_string_without_uid().hash(state);
    self.uid().hash(state);
  }
}
