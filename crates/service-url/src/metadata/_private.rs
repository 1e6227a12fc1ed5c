//! Metadata validations performed in compile time.

use compile_fmt::{Ascii, CompileArgs, clip, clip_ascii, compile_args, compile_panic};

use super::{ConfigMetadata, FieldMetadata, ItemKind, SemanticKind, UrlPart};

pub(crate) const fn const_eq(lhs: &[u8], rhs: &[u8]) -> bool {
    if lhs.len() != rhs.len() {
        return false;
    }

    let mut i = 0;
    while i < lhs.len() {
        if lhs[i] != rhs[i] {
            return false;
        }
        i += 1;
    }
    true
}

const fn is_valid_start_key_char(ch: u8) -> bool {
    ch == b'_' || ch.is_ascii_alphabetic()
}

const fn is_valid_key_char(ch: u8) -> bool {
    ch == b'_' || ch == b'-' || ch == b'.' || ch.is_ascii_alphanumeric()
}

#[derive(Debug, Clone, Copy)]
enum AllowedChars {
    KeyStart,
    Key,
}

impl AllowedChars {
    const fn as_str(self) -> Ascii<'static> {
        Ascii::new(match self {
            Self::KeyStart => "[_a-zA-Z]",
            Self::Key => "[_a-zA-Z0-9.-]",
        })
    }
}

#[derive(Debug)]
enum ValidationError {
    Empty,
    NonAscii {
        pos: usize,
    },
    DisallowedChar {
        pos: usize,
        ch: char,
        allowed: AllowedChars,
    },
}

type ErrorArgs = CompileArgs<106>;

impl ValidationError {
    const fn fmt(self) -> ErrorArgs {
        match self {
            Self::Empty => compile_args!(capacity: ErrorArgs::CAPACITY, "key cannot be empty"),
            Self::NonAscii { pos } => compile_args!(
                capacity: ErrorArgs::CAPACITY,
                "key contains non-ASCII chars, first at position ",
                pos => compile_fmt::fmt::<usize>()
            ),
            Self::DisallowedChar { pos, ch, allowed } => compile_args!(
                capacity: ErrorArgs::CAPACITY,
                "key contains a disallowed char '",
                ch => compile_fmt::fmt::<char>(),
                "' at position ", pos => compile_fmt::fmt::<usize>(),
                "; allowed chars are ",
                allowed.as_str() => clip_ascii(16, "")
            ),
        }
    }
}

const fn validate_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::Empty);
    }

    let key_bytes = key.as_bytes();
    let mut pos = 0;
    while pos < key.len() {
        if key_bytes[pos] > 127 {
            return Err(ValidationError::NonAscii { pos });
        }
        let ch = key_bytes[pos];
        let is_disallowed = (pos == 0 && !is_valid_start_key_char(ch)) || !is_valid_key_char(ch);
        if is_disallowed {
            return Err(ValidationError::DisallowedChar {
                pos,
                ch: ch as char,
                allowed: if pos == 0 {
                    AllowedChars::KeyStart
                } else {
                    AllowedChars::Key
                },
            });
        }
        pos += 1;
    }
    Ok(())
}

/// Checks that a query key is valid.
#[track_caller]
pub const fn assert_key(key: &str) {
    if let Err(err) = validate_key(key) {
        compile_panic!(
            "Query key `", key => clip(32, "…"), "` is invalid: ",
            &err.fmt() => compile_fmt::fmt::<&ErrorArgs>()
        );
    }
}

const fn same_slot(lhs: UrlPart, rhs: UrlPart) -> bool {
    match (lhs, rhs) {
        (UrlPart::User, UrlPart::User)
        | (UrlPart::Password, UrlPart::Password)
        | (UrlPart::Host, UrlPart::Host)
        | (UrlPart::Port, UrlPart::Port) => true,
        (UrlPart::Path(lhs), UrlPart::Path(rhs)) => lhs == rhs,
        _ => false,
    }
}

const fn path_index(part: UrlPart) -> Option<u8> {
    match part {
        UrlPart::Path(idx) => Some(idx),
        _ => None,
    }
}

impl ConfigMetadata {
    /// Checks schema invariants. Invoked in compile time by the derive macro.
    #[track_caller]
    pub const fn assert_valid(&self) {
        self.assert_field_keys();
        self.assert_unique_keys();
        self.assert_unique_slots();
        self.assert_contiguous_path();
        self.assert_supported_kinds();
    }

    #[track_caller]
    const fn assert_field_keys(&self) {
        let config_name = self.ty.name_in_code();
        let mut field_i = 0;
        while field_i < self.fields.len() {
            let field = &self.fields[field_i];
            if matches!(field.url_part, UrlPart::Query) && field.keys.is_empty() {
                compile_panic!(
                    "Field `", config_name => clip(32, "…"), ".", field.name => clip(32, "…"),
                    "` is serialized as a query param, but has no query keys"
                );
            }

            let mut key_i = 0;
            while key_i < field.keys.len() {
                assert_key(field.keys[key_i]);
                key_i += 1;
            }
            field_i += 1;
        }
    }

    #[track_caller]
    const fn assert_unique_keys(&self) {
        let config_name = self.ty.name_in_code();
        let mut field_i = 0;
        while field_i < self.fields.len() {
            let field = &self.fields[field_i];
            let mut key_i = 0;
            while key_i < field.keys.len() {
                let key = field.keys[key_i];
                assert_key_is_unique(config_name, key, field, key_i, self.fields, field_i);
                key_i += 1;
            }
            field_i += 1;
        }
    }

    #[track_caller]
    const fn assert_unique_slots(&self) {
        let config_name = self.ty.name_in_code();
        let mut i = 0;
        while i < self.fields.len() {
            let mut j = i + 1;
            while j < self.fields.len() {
                let (lhs, rhs) = (&self.fields[i], &self.fields[j]);
                if same_slot(lhs.url_part, rhs.url_part) {
                    compile_panic!(
                        "Fields `", config_name => clip(32, "…"), ".", lhs.name => clip(32, "…"),
                        "` and `", rhs.name => clip(32, "…"),
                        "` are placed into the same URL part"
                    );
                }
                j += 1;
            }
            i += 1;
        }
    }

    #[track_caller]
    const fn assert_contiguous_path(&self) {
        let config_name = self.ty.name_in_code();
        let mut max_index = 0_u8;
        let mut count = 0_usize;
        let mut i = 0;
        while i < self.fields.len() {
            if let Some(idx) = path_index(self.fields[i].url_part) {
                if idx == 0 {
                    compile_panic!(
                        "Field `", config_name => clip(32, "…"), ".", self.fields[i].name => clip(32, "…"),
                        "` has path index 0; path indices start from 1"
                    );
                }
                if idx > max_index {
                    max_index = idx;
                }
                count += 1;
            }
            i += 1;
        }

        // Since slots are unique, the indices are contiguous iff their count equals the max index.
        let max_index = max_index as usize;
        if count != max_index {
            compile_panic!(
                "Path indices in `", config_name => clip(32, "…"),
                "` are not contiguous: max index is ", max_index => compile_fmt::fmt::<usize>(),
                ", but there are ", count => compile_fmt::fmt::<usize>(), " path fields"
            );
        }
    }

    #[track_caller]
    const fn assert_supported_kinds(&self) {
        let config_name = self.ty.name_in_code();
        let mut i = 0;
        while i < self.fields.len() {
            let field = &self.fields[i];
            match field.kind {
                SemanticKind::List { item, .. } => {
                    if !matches!(item, ItemKind::Text | ItemKind::Int(_) | ItemKind::Composite) {
                        compile_panic!(
                            "Field `", config_name => clip(32, "…"), ".", field.name => clip(32, "…"),
                            "` is a list with unsupported items; only text, integer and composite items are supported"
                        );
                    }
                }
                SemanticKind::Map { value } => {
                    if !matches!(value, ItemKind::Text | ItemKind::Int(_)) {
                        compile_panic!(
                            "Field `", config_name => clip(32, "…"), ".", field.name => clip(32, "…"),
                            "` is a map with unsupported values; only text and integer values are supported"
                        );
                    }
                }
                _ => { /* all other kinds are supported */ }
            }
            i += 1;
        }
    }
}

#[track_caller]
const fn assert_key_is_unique(
    config_name: &'static str,
    key: &'static str,
    field: &FieldMetadata,
    key_i: usize,
    fields: &[FieldMetadata],
    field_i: usize,
) {
    // Check against the remaining keys of the same field...
    let mut other_key_i = key_i + 1;
    while other_key_i < field.keys.len() {
        if const_eq(key.as_bytes(), field.keys[other_key_i].as_bytes()) {
            compile_panic!(
                "Query key `", key => clip(32, "…"), "` is repeated for field `",
                config_name => clip(32, "…"), ".", field.name => clip(32, "…"), "`"
            );
        }
        other_key_i += 1;
    }

    // ...and against all keys of the subsequent fields.
    let mut other_i = field_i + 1;
    while other_i < fields.len() {
        let other = &fields[other_i];
        let mut other_key_i = 0;
        while other_key_i < other.keys.len() {
            if const_eq(key.as_bytes(), other.keys[other_key_i].as_bytes()) {
                compile_panic!(
                    "Query key `", key => clip(32, "…"), "` of field `",
                    config_name => clip(32, "…"), ".", field.name => clip(32, "…"),
                    "` coincides with a key of field `", other.name => clip(32, "…"), "`"
                );
            }
            other_key_i += 1;
        }
        other_i += 1;
    }
}
