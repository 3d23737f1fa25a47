//! Single-pass decode and render loop.
//!
//! Walks the byte stream once, dispatches per opcode and renders a textual
//! trace. Three pieces of side state survive across iterations: a pending
//! inline-storage boundary (scheduled by `Jump`), a pending label flag
//! (raised by `Main`/`Return`) and the append-only subroutine table.

use core::fmt::Write as _;

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, trace};
use typebc_core::{read_slice, read_u16, read_u32};

use crate::{DisasmError, DisasmResult, Op};

/// Bytes of one embedded source-map entry: 3×u32 (ip, line, column).
const SOURCE_MAP_ENTRY: usize = 12;

/// Subroutine label discovered while decoding.
///
/// Appended when `Subroutine` or `Main` is decoded; consulted when a label
/// is due, by matching `address` against the cursor (first-declared-wins).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubroutineRecord {
    /// Resolved name (empty when declared without one).
    pub name: String,
    /// Byte offset where the routine body starts.
    pub address: u32,
}

/// Resolve a length-prefixed storage entry at `address`.
///
/// Read-only projection of the stream (`[len u16][len bytes]`), independent
/// of the decode cursor.
pub fn read_storage(bin: &[u8], address: u32) -> DisasmResult<&[u8]> {
    let at = address as usize;
    let size = read_u16(bin, at).map_err(|_| DisasmError::MalformedReference { address })?;
    read_slice(bin, at + 2, size as usize)
        .map_err(|_| DisasmError::MalformedReference { address })
}

/// Decoder context: the cursor plus the cross-instruction side state.
///
/// The context owns its output buffer, so the best-effort trace survives a
/// failed [`run`](Self::run) and can still be taken by the caller.
#[derive(Debug)]
pub struct Disassembler<'a> {
    bin: &'a [u8],
    pos: usize,
    storage_end: Option<u32>,
    awaiting_label: bool,
    subroutines: Vec<SubroutineRecord>,
    out: String,
}

impl<'a> Disassembler<'a> {
    /// Create a disassembler over a complete, already-buffered stream.
    pub fn new(bin: &'a [u8]) -> Self {
        let mut out = String::new();
        let _ = write!(out, "Bin {} bytes: ", bin.len());
        Self {
            bin,
            pos: 0,
            storage_end: None,
            awaiting_label: false,
            subroutines: Vec::new(),
            out,
        }
    }

    /// Current cursor offset.
    pub fn offset(&self) -> usize { self.pos }

    /// Subroutine records discovered so far, in declaration order.
    pub fn subroutines(&self) -> &[SubroutineRecord] { &self.subroutines }

    /// Trace rendered so far. After a failed run this is the best-effort
    /// output up to the failure point.
    pub fn output(&self) -> &str { &self.out }

    /// Consume the context, keeping the rendered trace.
    pub fn into_trace(self) -> String { self.out }

    /// Decode and render everything left in the stream.
    pub fn run(&mut self) -> DisasmResult<()> {
        while self.step()? {}
        self.out.push('\n');
        Ok(())
    }

    /// One iteration of the decode loop: drain a pending storage region,
    /// resolve a pending label, then decode one instruction. Returns `false`
    /// once the stream is exhausted.
    pub fn step(&mut self) -> DisasmResult<bool> {
        if self.pos >= self.bin.len() {
            return Ok(false);
        }

        if let Some(end) = self.storage_end.take() {
            self.drain_storage(end as usize)?;
        }
        if self.awaiting_label {
            self.render_label();
            self.awaiting_label = false;
        }
        if self.pos >= self.bin.len() {
            return Ok(false);
        }

        self.decode_one()?;
        Ok(true)
    }

    /// Render back-to-back `[len u16][bytes]` entries until the cursor
    /// reaches `end`, then close the run with an empty-line separator.
    fn drain_storage(&mut self, end: usize) -> DisasmResult<()> {
        while self.pos < end {
            let size = read_u16(self.bin, self.pos)? as usize;
            let data = read_slice(self.bin, self.pos + 2, size)?;
            let _ = write!(
                self.out,
                "(Storage ({size})\"{}\") ",
                String::from_utf8_lossy(data)
            );
            self.pos += 2 + size;
        }
        self.out.push('\n');
        Ok(())
    }

    /// Resolve the label for code starting at the cursor: first record whose
    /// address equals the current offset wins; no match renders the
    /// unidentified-routine header.
    fn render_label(&mut self) {
        let at = self.pos as u32;
        match self.subroutines.iter().position(|r| r.address == at) {
            Some(index) => {
                let name = &self.subroutines[index].name;
                let _ = write!(self.out, "\n&{index} {name}(): ");
            }
            None => self.out.push_str("\nunknown!(): "),
        }
    }

    fn decode_one(&mut self) -> DisasmResult<()> {
        let bin = self.bin;
        let pos = self.pos;
        let op = Op::from(bin[pos]);
        trace!(offset = pos, op = %op, "decode");

        // Operand bytes past the tag; the cursor advances by 1 + width.
        let mut width = 0usize;
        let mut params = String::new();

        match op {
            Op::Call => {
                let target = read_u32(bin, pos + 1)?;
                let args = read_u16(bin, pos + 5)?;
                let _ = write!(params, " &{target}[{args}]");
                width = 6;
            }
            Op::SourceMap => {
                let size = read_u32(bin, pos + 1)? as usize;
                let table = read_slice(bin, pos + 5, size)?;
                self.dump_source_map(table);
                let _ = write!(
                    params,
                    " {}->{} ({})",
                    pos + 1,
                    pos + 4 + size,
                    size / SOURCE_MAP_ENTRY
                );
                width = 4 + size;
            }
            Op::Subroutine => {
                let name_address = read_u32(bin, pos + 1)?;
                let address = read_u32(bin, pos + 5)?;
                let name = if name_address == 0 {
                    String::new()
                } else {
                    String::from_utf8_lossy(read_storage(bin, name_address)?).into_owned()
                };
                let _ = write!(params, " {name}[{address}]");
                self.subroutines.push(SubroutineRecord { name, address });
                width = 8;
            }
            Op::Main => {
                let address = read_u32(bin, pos + 1)?;
                let _ = write!(params, " &{address}");
                self.subroutines.push(SubroutineRecord { name: "main".into(), address });
                self.awaiting_label = true;
                width = 4;
            }
            Op::Jump => {
                let address = read_u32(bin, pos + 1)?;
                let _ = write!(params, " &{address}");
                // address 0 never bounds a region (code starts there)
                self.storage_end = (address != 0).then_some(address);
                width = 4;
            }
            Op::Return => {
                self.awaiting_label = true;
            }
            Op::JumpCondition => {
                let then_target = read_u16(bin, pos + 1)?;
                let else_target = read_u16(bin, pos + 3)?;
                let _ = write!(params, " &{then_target}:&{else_target}");
                width = 4;
            }
            Op::Set | Op::TypeArgumentDefault | Op::Distribute | Op::FunctionRef => {
                let address = read_u32(bin, pos + 1)?;
                let _ = write!(params, " &{address}");
                width = 4;
            }
            Op::Instantiate => {
                let count = read_u16(bin, pos + 1)?;
                let _ = write!(params, " {count}");
                width = 2;
            }
            Op::CallExpression => {
                let args = read_u16(bin, pos + 1)?;
                let _ = write!(params, " &{args}");
                width = 2;
            }
            Op::Loads => {
                let frame = read_u16(bin, pos + 1)?;
                let slot = read_u16(bin, pos + 3)?;
                let _ = write!(params, " &{frame}:{slot}");
                width = 4;
            }
            Op::Parameter | Op::NumberLiteral | Op::BigIntLiteral | Op::StringLiteral => {
                let address = read_u32(bin, pos + 1)?;
                let text = String::from_utf8_lossy(read_storage(bin, address)?);
                let _ = write!(params, " \"{text}\"");
                width = 4;
            }
            Op::Noop | Op::Halt | Op::Unknown(_) => {}
        }

        if params.is_empty() {
            let _ = write!(self.out, "{op} ");
        } else {
            let _ = write!(self.out, "({op}{params}) ");
        }
        self.pos = pos + 1 + width;
        Ok(())
    }

    /// Decode the embedded (ip, line, column) entries at debug level; they
    /// are side-band data and never part of the rendered trace.
    fn dump_source_map(&self, table: &[u8]) {
        for entry in table.chunks_exact(SOURCE_MAP_ENTRY) {
            let ip = LittleEndian::read_u32(&entry[0..4]);
            let line = LittleEndian::read_u32(&entry[4..8]);
            let column = LittleEndian::read_u32(&entry[8..12]);
            debug!(ip, line, column, "source map entry");
        }
    }
}

/// Disassemble a complete stream into its textual trace.
///
/// Thin wrapper over [`Disassembler`]. On failure the partial trace is
/// dropped; keep the context value around when you need it.
pub fn disassemble(bin: &[u8]) -> DisasmResult<String> {
    let mut d = Disassembler::new(bin);
    d.run()?;
    Ok(d.into_trace())
}
