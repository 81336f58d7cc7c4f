use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::checker::Checker;
use crate::flags::NameFlagSet;
use crate::quantifier::Quantifier;
use crate::seq::PatternSeq;
use crate::types::Type;

/// A reference to a type that is resolved lazily, at matching time, by
/// looking up its name in a [`crate::TypeProvider`].
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TypeRef {
    name: String,
    param: Option<String>,
}

impl TypeRef {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into(), param: None }
    }

    /// Sets the parameter passed to the type's hooks.
    pub fn with_param<S: Into<String>>(mut self, param: S) -> Self {
        self.param = Some(param.into());
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    #[inline]
    pub fn param(&self) -> Option<&str> {
        self.param.as_deref()
    }
}

/// What an entry matches.
#[derive(Clone)]
pub enum Payload {
    Checker(Checker),
    /// An already resolved type.
    Type(Arc<dyn Type>),
    /// A type that is resolved at matching time.
    TypeRef(TypeRef),
}

impl Payload {
    /// Returns the checker if this payload is a [`Payload::Checker`].
    #[inline]
    pub fn as_checker(&self) -> Option<&Checker> {
        if let Payload::Checker(checker) = self {
            Some(checker)
        } else {
            None
        }
    }

    #[inline]
    pub fn is_typed(&self) -> bool {
        !matches!(self, Payload::Checker(_))
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Payload::Checker(a), Payload::Checker(b)) => a == b,
            // Types are identified by their names.
            (Payload::Type(a), Payload::Type(b)) => a.name() == b.name(),
            (Payload::TypeRef(a), Payload::TypeRef(b)) => a == b,
            _ => false,
        }
    }
}

impl Debug for Payload {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Checker(checker) => {
                f.debug_tuple("Checker").field(checker).finish()
            }
            Payload::Type(ty) => f.debug_tuple("Type").field(&ty.name()).finish(),
            Payload::TypeRef(type_ref) => {
                f.debug_tuple("TypeRef").field(type_ref).finish()
            }
        }
    }
}

/// One named, quantified slot in a [`PatternSeq`].
///
/// Entries are immutable once built, the builder-style methods consume the
/// entry and return a new one.
#[derive(Clone, Debug, PartialEq)]
pub struct PatternEntry {
    name: Option<Arc<str>>,
    flags: NameFlagSet,
    quantifier: Quantifier,
    payload: Payload,
    second_stage: Option<Arc<PatternSeq>>,
}

impl PatternEntry {
    /// Creates an anonymous entry that matches `checker` exactly once.
    pub fn new<C: Into<Checker>>(checker: C) -> Self {
        Self::with_payload(Payload::Checker(checker.into()))
    }

    /// Creates an anonymous entry for an already resolved type.
    pub fn typed(ty: Arc<dyn Type>) -> Self {
        Self::with_payload(Payload::Type(ty))
    }

    /// Creates an anonymous entry that references a type by name.
    pub fn type_ref(type_ref: TypeRef) -> Self {
        Self::with_payload(Payload::TypeRef(type_ref))
    }

    fn with_payload(payload: Payload) -> Self {
        Self {
            name: None,
            flags: NameFlagSet::none(),
            quantifier: Quantifier::ONE,
            payload,
            second_stage: None,
        }
    }

    /// Sets the name under which the entry is captured.
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(Arc::from(name));
        self.flags = NameFlagSet::from_name(name);
        self
    }

    /// Sets the quantifier.
    pub fn quantified(mut self, quantifier: Quantifier) -> Self {
        self.quantifier = quantifier;
        self
    }

    /// Returns a copy of this entry with a different quantifier.
    pub fn with_quantifier(&self, quantifier: Quantifier) -> Self {
        Self { quantifier, ..self.clone() }
    }

    /// Sets the grammar used for re-parsing the text captured by this entry
    /// once the first stage match is complete.
    pub fn second_stage(mut self, seq: PatternSeq) -> Self {
        self.second_stage = Some(Arc::new(seq));
        self
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub(crate) fn name_arc(&self) -> Option<&Arc<str>> {
        self.name.as_ref()
    }

    #[inline]
    pub fn quantifier(&self) -> Quantifier {
        self.quantifier
    }

    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    #[inline]
    pub fn second_stage_seq(&self) -> Option<&Arc<PatternSeq>> {
        self.second_stage.as_ref()
    }

    /// Returns the parameter for the entry's type, if any.
    #[inline]
    pub fn param(&self) -> Option<&str> {
        match &self.payload {
            Payload::TypeRef(type_ref) => type_ref.param(),
            _ => None,
        }
    }

    /// Flags derived from the entry's name.
    #[inline]
    pub fn flags(&self) -> NameFlagSet {
        self.flags
    }

    /// Returns true if the entry must match at least once and its payload
    /// always consumes input when it matches.
    pub(crate) fn is_mandatory_terminal(&self) -> bool {
        self.quantifier.lower_bound() > 0
            && self
                .payload
                .as_checker()
                .map_or(false, Checker::always_consumes)
    }
}

impl Display for PatternEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        if let Some(name) = &self.name {
            write!(f, "{}:", name)?;
        }
        match &self.payload {
            Payload::Checker(checker) => write!(f, "{}", checker)?,
            Payload::Type(ty) => write!(f, "!{}!", ty.name())?,
            Payload::TypeRef(type_ref) => {
                write!(f, "!{}", type_ref.name())?;
                if let Some(param) = type_ref.param() {
                    write!(f, "({})", param)?;
                }
                write!(f, "!")?;
            }
        }
        if let Some(second_stage) = &self.second_stage {
            write!(f, "=>{{{}}}", second_stage)?;
        }
        write!(f, "){}", self.quantifier)
    }
}
