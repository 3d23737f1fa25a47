//! typebc-disasm — désassembleur du flux d'instructions typebc
//!
//! Le flux est produit par le compilateur de la VM de typage ; il mélange
//! instructions, données inline et side-band dans une même séquence :
//!
//! ```text
//! instruction = tag u8 + opérandes LE (layout fixé par le tag, voir `Op`)
//! storage     = [len u16][len octets]*, inline, borné par la cible du
//!               `Jump` qui le précède (le saut enjambe les données)
//! source map  = u32 size + size octets d'entrées 3×u32 (ip, ligne, colonne),
//!               embarquée après son tag `SourceMap`
//! ```
//!
//! Le désassemblage est une passe unique gauche→droite : aucune exécution,
//! aucune mutation du flux, sortie texte déterministe.
//!
//! API :
//! - [`disassemble`] : flux complet → trace texte
//! - [`Disassembler`] : contexte pas-à-pas (conserve la sortie partielle
//!   en cas d'erreur, expose la table des sous-routines)

#![deny(missing_docs)]

use thiserror::Error;
use typebc_core::StreamError;

pub mod disasm;
pub mod op;

pub use disasm::{disassemble, read_storage, Disassembler, SubroutineRecord};
pub use op::Op;

/// Alias résultat commun au crate.
pub type DisasmResult<T> = Result<T, DisasmError>;

/// Erreurs de décodage.
///
/// Le décodage s'arrête à la première erreur ; la trace déjà rendue reste
/// disponible via [`Disassembler::output`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DisasmError {
    /// Une lecture à largeur fixe ou une longueur embarquée déborde du flux.
    #[error("truncated stream: {0}")]
    TruncatedStream(#[from] StreamError),

    /// Une référence storage ne résout pas vers une entrée `[len u16][octets]`
    /// bien formée à l'intérieur du flux.
    #[error("malformed storage reference at address {address}")]
    MalformedReference {
        /// Adresse résolue fautive.
        address: u32,
    },
}
