//! Closed opcode set of the type-checking VM stream.
//!
//! Each tag is one byte; the operand layout (count and width of trailing
//! fields) is a static property of the tag, never inferred from data. Bytes
//! outside the set decode to [`Op::Unknown`] and carry zero operands.

use core::fmt;

const OP_NOOP: u8 = 0;
const OP_JUMP: u8 = 1;
const OP_HALT: u8 = 2;
const OP_SOURCE_MAP: u8 = 3;
const OP_MAIN: u8 = 4;
const OP_RETURN: u8 = 5;
const OP_CALL: u8 = 6;
const OP_JUMP_CONDITION: u8 = 7;
const OP_SET: u8 = 8;
const OP_SUBROUTINE: u8 = 9;
const OP_LOADS: u8 = 10;
const OP_PARAMETER: u8 = 11;
const OP_STRING_LITERAL: u8 = 12;
const OP_NUMBER_LITERAL: u8 = 13;
const OP_BIGINT_LITERAL: u8 = 14;
const OP_FUNCTION_REF: u8 = 15;
const OP_CALL_EXPRESSION: u8 = 16;
const OP_INSTANTIATE: u8 = 17;
const OP_TYPE_ARGUMENT_DEFAULT: u8 = 18;
const OP_DISTRIBUTE: u8 = 19;

/// One-byte instruction tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// No effect, no operands.
    Noop,
    /// Unconditional jump; its target also bounds the inline storage run
    /// that the compiler emits right behind it.
    Jump,
    /// Stops the machine.
    Halt,
    /// Embedded side-band table mapping instruction offsets to line/column.
    SourceMap,
    /// Entry point declaration; labels the code starting at its address.
    Main,
    /// Subroutine declaration: name reference + body address.
    Subroutine,
    /// End of the current subroutine body.
    Return,
    /// Call of a subroutine with an argument count.
    Call,
    /// Two-way branch (then/else targets).
    JumpCondition,
    /// Writes a type into a slot.
    Set,
    /// Default value for a type argument.
    TypeArgumentDefault,
    /// Distributes a union over the following template.
    Distribute,
    /// Reference to a function type.
    FunctionRef,
    /// Instantiates a generic with the given type-argument count.
    Instantiate,
    /// Call expression with an argument count.
    CallExpression,
    /// Loads a frame slot (frame offset : slot index).
    Loads,
    /// Named parameter; name lives in storage.
    Parameter,
    /// Number literal; digits live in storage.
    NumberLiteral,
    /// BigInt literal; digits live in storage.
    BigIntLiteral,
    /// String literal; bytes live in storage.
    StringLiteral,
    /// Tag value outside the known set; decoded with zero operands.
    Unknown(u8),
}

impl From<u8> for Op {
    fn from(tag: u8) -> Self {
        match tag {
            OP_NOOP => Op::Noop,
            OP_JUMP => Op::Jump,
            OP_HALT => Op::Halt,
            OP_SOURCE_MAP => Op::SourceMap,
            OP_MAIN => Op::Main,
            OP_RETURN => Op::Return,
            OP_CALL => Op::Call,
            OP_JUMP_CONDITION => Op::JumpCondition,
            OP_SET => Op::Set,
            OP_SUBROUTINE => Op::Subroutine,
            OP_LOADS => Op::Loads,
            OP_PARAMETER => Op::Parameter,
            OP_STRING_LITERAL => Op::StringLiteral,
            OP_NUMBER_LITERAL => Op::NumberLiteral,
            OP_BIGINT_LITERAL => Op::BigIntLiteral,
            OP_FUNCTION_REF => Op::FunctionRef,
            OP_CALL_EXPRESSION => Op::CallExpression,
            OP_INSTANTIATE => Op::Instantiate,
            OP_TYPE_ARGUMENT_DEFAULT => Op::TypeArgumentDefault,
            OP_DISTRIBUTE => Op::Distribute,
            other => Op::Unknown(other),
        }
    }
}

impl Op {
    /// Wire value of the tag.
    pub const fn to_u8(self) -> u8 {
        match self {
            Op::Noop => OP_NOOP,
            Op::Jump => OP_JUMP,
            Op::Halt => OP_HALT,
            Op::SourceMap => OP_SOURCE_MAP,
            Op::Main => OP_MAIN,
            Op::Return => OP_RETURN,
            Op::Call => OP_CALL,
            Op::JumpCondition => OP_JUMP_CONDITION,
            Op::Set => OP_SET,
            Op::Subroutine => OP_SUBROUTINE,
            Op::Loads => OP_LOADS,
            Op::Parameter => OP_PARAMETER,
            Op::StringLiteral => OP_STRING_LITERAL,
            Op::NumberLiteral => OP_NUMBER_LITERAL,
            Op::BigIntLiteral => OP_BIGINT_LITERAL,
            Op::FunctionRef => OP_FUNCTION_REF,
            Op::CallExpression => OP_CALL_EXPRESSION,
            Op::Instantiate => OP_INSTANTIATE,
            Op::TypeArgumentDefault => OP_TYPE_ARGUMENT_DEFAULT,
            Op::Distribute => OP_DISTRIBUTE,
            Op::Unknown(other) => other,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Unknown(tag) => write!(f, "Unknown(0x{tag:02X})"),
            known => write!(f, "{known:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tag_roundtrip() {
        for tag in 0u8..=255 {
            assert_eq!(Op::from(tag).to_u8(), tag);
        }
    }

    #[test]
    fn display_uses_variant_names() {
        assert_eq!(Op::TypeArgumentDefault.to_string(), "TypeArgumentDefault");
        assert_eq!(Op::Unknown(0x2A).to_string(), "Unknown(0x2A)");
    }
}
