//! typebc-core — primitives de flux partagées par l'outillage typebc
//!
//! Fournit :
//! - lectures little-endian bornées à offset arbitraire (`read_u16`, `read_u32`)
//! - tranches bornées (`read_slice`)
//! - IO mémoire : `ByteWriter` (buffer croissant, pratique pour les fixtures)
//! - erreurs `StreamError` + alias `StreamResult<T>`
//!
//! Toutes les lectures sont des projections pures du flux : aucune position
//! n'est portée ici, l'appelant fournit l'offset à chaque appel.

#![deny(missing_docs)]

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

/* ─────────────────────────── Résultat commun ─────────────────────────── */

/// Alias résultat commun au core.
pub type StreamResult<T> = Result<T, StreamError>;

/// Erreurs de bas niveau sur un flux d'octets.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// Fin de flux inattendue : la lecture demandée déborde du buffer.
    #[error("unexpected end of stream: need {needed} bytes at offset {at}")]
    Truncated {
        /// Offset où la lecture a commencé.
        at: usize,
        /// Nombre d'octets demandés.
        needed: usize,
    },
}

/* ─────────────────────────── Lectures (LE) ─────────────────────────── */

fn take(bin: &[u8], at: usize, needed: usize) -> StreamResult<&[u8]> {
    let end = at
        .checked_add(needed)
        .ok_or(StreamError::Truncated { at, needed })?;
    if end > bin.len() {
        return Err(StreamError::Truncated { at, needed });
    }
    Ok(&bin[at..end])
}

/// Lit un u16 little-endian à `at`.
pub fn read_u16(bin: &[u8], at: usize) -> StreamResult<u16> {
    Ok(LittleEndian::read_u16(take(bin, at, 2)?))
}

/// Lit un u32 little-endian à `at`.
pub fn read_u32(bin: &[u8], at: usize) -> StreamResult<u32> {
    Ok(LittleEndian::read_u32(take(bin, at, 4)?))
}

/// Lit `len` octets à `at`.
pub fn read_slice(bin: &[u8], at: usize, len: usize) -> StreamResult<&[u8]> {
    take(bin, at, len)
}

/* ─────────────────────────── Byte Writer (LE) ─────────────────────────── */

/// Buffer d'écriture (croît automatiquement).
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Crée un writer vide.
    pub fn new() -> Self { Self { buf: Vec::new() } }
    /// Offset courant (= taille écrite).
    pub fn offset(&self) -> usize { self.buf.len() }
    /// Vrai si rien n'a été écrit.
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }
    /// Accès en lecture au contenu.
    pub fn as_slice(&self) -> &[u8] { &self.buf }
    /// Récupère le buffer (consomme).
    pub fn into_vec(self) -> Vec<u8> { self.buf }
    /// Ajoute des octets bruts.
    pub fn write_bytes(&mut self, bytes: &[u8]) { self.buf.extend_from_slice(bytes); }
    /// Écrit un u8.
    pub fn write_u8(&mut self, v: u8) { self.buf.push(v); }
    /// Écrit un u16 little-endian.
    pub fn write_u16_le(&mut self, v: u16) { self.buf.extend_from_slice(&v.to_le_bytes()); }
    /// Écrit un u32 little-endian.
    pub fn write_u32_le(&mut self, v: u32) { self.buf.extend_from_slice(&v.to_le_bytes()); }
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn writer_reader_le() -> StreamResult<()> {
        let mut w = ByteWriter::new();
        w.write_u8(0x07);
        w.write_u16_le(0xBEEF);
        w.write_u32_le(0xDEAD_BEEF);
        w.write_bytes(b"abc");

        let bin = w.as_slice();
        assert_eq!(bin[0], 0x07);
        assert_eq!(read_u16(bin, 1)?, 0xBEEF);
        assert_eq!(read_u32(bin, 3)?, 0xDEAD_BEEF);
        assert_eq!(read_slice(bin, 7, 3)?, b"abc");
        Ok(())
    }

    #[test]
    fn reads_are_positional() -> StreamResult<()> {
        let bin = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        // same offset twice: no cursor is carried
        assert_eq!(read_u16(&bin, 2)?, 0x0403);
        assert_eq!(read_u16(&bin, 2)?, 0x0403);
        Ok(())
    }

    #[test]
    fn truncated_read_reports_offset() {
        let bin = [0u8; 3];
        assert_eq!(
            read_u32(&bin, 1),
            Err(StreamError::Truncated { at: 1, needed: 4 })
        );
        assert_eq!(
            read_slice(&bin, 3, 1),
            Err(StreamError::Truncated { at: 3, needed: 1 })
        );
    }

    #[test]
    fn offset_overflow_is_truncation() {
        let bin = [0u8; 3];
        assert_eq!(
            read_u16(&bin, usize::MAX),
            Err(StreamError::Truncated { at: usize::MAX, needed: 2 })
        );
    }
}
