use std::fmt;

/// Type tag of a control element, as reported by the subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElemKind {
    Boolean,
    Integer,
    Integer64,
    Enumerated,
    Bytes,
    Iec958,
    Unknown,
}

impl ElemKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::Integer => "INTEGER",
            Self::Integer64 => "INTEGER64",
            Self::Enumerated => "ENUMERATED",
            Self::Bytes => "BYTES",
            Self::Iec958 => "IEC958",
            Self::Unknown => "NONE",
        }
    }
}

impl fmt::Display for ElemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Current value of a control element, one variant per type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Boolean(Vec<bool>),
    Integer(Vec<i32>),
    Integer64(Vec<i64>),
    Enumerated(Vec<u32>),
    Bytes(Vec<u8>),
    Iec958([u8; 4]),
    Unknown { count: u32 },
}

impl Value {
    pub fn kind(&self) -> ElemKind {
        match self {
            Self::Boolean(_) => ElemKind::Boolean,
            Self::Integer(_) => ElemKind::Integer,
            Self::Integer64(_) => ElemKind::Integer64,
            Self::Enumerated(_) => ElemKind::Enumerated,
            Self::Bytes(_) => ElemKind::Bytes,
            Self::Iec958(_) => ElemKind::Iec958,
            Self::Unknown { .. } => ElemKind::Unknown,
        }
    }

    /// Number of value slots this value carries. The IEC958 status block is a
    /// single slot no matter how many bytes it holds.
    pub fn count(&self) -> u32 {
        match self {
            Self::Boolean(v) => v.len() as u32,
            Self::Integer(v) => v.len() as u32,
            Self::Integer64(v) => v.len() as u32,
            Self::Enumerated(v) => v.len() as u32,
            Self::Bytes(v) => v.len() as u32,
            Self::Iec958(_) => 1,
            Self::Unknown { count } => *count,
        }
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            f.write_str(",")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(values) => {
                for (idx, on) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str(if *on { "on" } else { "off" })?;
                }
                Ok(())
            }
            Self::Integer(values) => write_joined(f, values),
            Self::Integer64(values) => write_joined(f, values),
            Self::Enumerated(values) => write_joined(f, values),
            Self::Bytes(values) => {
                for (idx, byte) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "0x{byte:02x}")?;
                }
                Ok(())
            }
            // One fixed-format block per event, not per slot. The status
            // layout is set by the wire protocol, not by the reported count.
            Self::Iec958(status) => write!(
                f,
                "[AES0=0x{:02x} AES1=0x{:02x} AES2=0x{:02x} AES3=0x{:02x}]",
                status[0], status[1], status[2], status[3]
            ),
            Self::Unknown { count } => {
                for idx in 0..*count {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str("?")?;
                }
                Ok(())
            }
        }
    }
}

/// The one-line report emitted for a value-change event.
pub fn changed_line(name: &str, kind: ElemKind, value: &Value) -> String {
    format!("'{name}' ({kind}) changed: {value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_render_on_off() {
        let value = Value::Boolean(vec![true, false, true]);
        assert_eq!(value.to_string(), "on,off,on");
    }

    #[test]
    fn integers_render_signed_decimal() {
        assert_eq!(Value::Integer(vec![3, 5]).to_string(), "3,5");
        assert_eq!(Value::Integer(vec![-7]).to_string(), "-7");
        assert_eq!(
            Value::Integer64(vec![i64::MIN, i64::MAX]).to_string(),
            format!("{},{}", i64::MIN, i64::MAX)
        );
    }

    #[test]
    fn enumerated_renders_unsigned_index() {
        assert_eq!(Value::Enumerated(vec![0, 4, 2]).to_string(), "0,4,2");
    }

    #[test]
    fn bytes_render_two_digit_lowercase_hex() {
        assert_eq!(
            Value::Bytes(vec![0x00, 0x0f, 0xab]).to_string(),
            "0x00,0x0f,0xab"
        );
    }

    #[test]
    fn iec958_renders_one_block() {
        let value = Value::Iec958([0x04, 0x82, 0x00, 0x02]);
        assert_eq!(
            value.to_string(),
            "[AES0=0x04 AES1=0x82 AES2=0x00 AES3=0x02]"
        );
        assert_eq!(value.count(), 1);
    }

    #[test]
    fn unknown_renders_placeholder_per_slot() {
        assert_eq!(Value::Unknown { count: 3 }.to_string(), "?,?,?");
        assert_eq!(Value::Unknown { count: 1 }.to_string(), "?");
    }

    #[test]
    fn rendered_token_count_matches_cardinality() {
        let cases: Vec<(Value, usize)> = vec![
            (Value::Boolean(vec![true; 4]), 4),
            (Value::Integer(vec![1, 2, 3]), 3),
            (Value::Integer64(vec![9]), 1),
            (Value::Enumerated(vec![0, 1]), 2),
            (Value::Bytes(vec![0xff; 6]), 6),
            (Value::Unknown { count: 5 }, 5),
            // The status block collapses to a single token regardless of the
            // declared slot count.
            (Value::Iec958([0; 4]), 1),
        ];
        for (value, expected) in cases {
            let rendered = value.to_string();
            // No commas occur inside the IEC958 block, so splitting on ','
            // counts tokens for every variant.
            assert_eq!(rendered.split(',').count(), expected, "{rendered}");
        }
    }

    #[test]
    fn changed_line_format() {
        let line = changed_line("Volume", ElemKind::Integer, &Value::Integer(vec![3, 5]));
        assert_eq!(line, "'Volume' (INTEGER) changed: 3,5");
    }

    #[test]
    fn kind_names_match_subsystem_spelling() {
        assert_eq!(ElemKind::Boolean.name(), "BOOLEAN");
        assert_eq!(ElemKind::Iec958.name(), "IEC958");
        assert_eq!(ElemKind::Unknown.name(), "NONE");
    }
}
