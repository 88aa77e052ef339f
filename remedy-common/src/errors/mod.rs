//! Status and suggestion catalog for remedy.
//!
//! Every failure the engine sees is mapped onto a closed set of status
//! codes, each optionally accompanied by ordered remediation suggestions.
//!
//! # Status Code Ranges
//!
//! | Range      | Phase        |
//! |------------|--------------|
//! | E000       | (any)        |
//! | E100-E199  | Init         |
//! | E200-E299  | Build        |
//! | E300-E399  | Deploy       |
//! | E400-E499  | StatusCheck  |
//! | E500-E599  | FileSync     |
//! | E600-E699  | DevInit      |
//! | E700-E799  | Cleanup      |

pub mod catalog;
pub mod suggestion;

pub use catalog::{StatusCode, SuggestionCode};
pub use suggestion::{Suggestion, concat_suggestions};
