use bitmask::bitmask;

bitmask! {
    /// Behavioral flags encoded in the names of entries and types.
    ///
    /// The flags are derived from the name by convention:
    ///
    /// * `$name`   - the captured sub-tree is reduced to plain text.
    /// * `name[]`  - adjacent captures with the same name and type are merged.
    /// * `name?`   - the type has a validation hook.
    /// * `name~`   - the validation hook needs the context of the parent
    ///               result, so it's deferred until the whole match is done.
    ///               Implies `?`.
    /// * `name*`   - a capture with a single child is replaced by the child.
    /// * `name+`   - a capture is replaced by all its children.
    ///
    /// Suffixes can be combined, as in `$item[]+`.
    #[derive(Debug)]
    pub mask NameFlagSet: u8 where flags NameFlags {
        Text                = 0x01,
        Collective          = 0x02,
        HasValidation       = 0x04,
        NotSelfContained    = 0x08,
        FlattenSingle       = 0x10,
        FlattenAll          = 0x20,
    }
}

impl NameFlagSet {
    /// Derives the flags from a name.
    pub fn from_name(name: &str) -> Self {
        let mut flags = NameFlagSet::none();
        let mut s = name;

        if let Some(rest) = s.strip_prefix('$') {
            flags.set(NameFlags::Text);
            s = rest;
        }

        loop {
            if let Some(rest) = s.strip_suffix("[]") {
                flags.set(NameFlags::Collective);
                s = rest;
                continue;
            }
            match s.chars().last() {
                Some('?') => flags.set(NameFlags::HasValidation),
                Some('~') => {
                    flags.set(NameFlags::HasValidation);
                    flags.set(NameFlags::NotSelfContained);
                }
                Some('*') => flags.set(NameFlags::FlattenSingle),
                Some('+') => flags.set(NameFlags::FlattenAll),
                _ => break,
            }
            s = &s[..s.len() - 1];
        }

        flags
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        self.contains(NameFlags::Text)
    }

    #[inline]
    pub fn is_collective(&self) -> bool {
        self.contains(NameFlags::Collective)
    }

    #[inline]
    pub fn has_validation(&self) -> bool {
        self.contains(NameFlags::HasValidation)
    }

    #[inline]
    pub fn is_self_contained(&self) -> bool {
        !self.contains(NameFlags::NotSelfContained)
    }

    #[inline]
    pub fn flatten_single(&self) -> bool {
        self.contains(NameFlags::FlattenSingle)
    }

    #[inline]
    pub fn flatten_all(&self) -> bool {
        self.contains(NameFlags::FlattenAll)
    }
}
