use std::path::PathBuf;

use thiserror::Error;

/// Failures of collection mutations, reported per operation.
///
/// The in-memory collection is unchanged whenever one of these is returned.
#[derive(Error, Debug)]
pub enum LibraryError {
    /// Draft rejected before reaching the store.
    #[error("{0}")]
    Validation(String),

    /// Store refused a new game.
    #[error("Erro ao adicionar jogo: {0:#}")]
    AddFailed(anyhow::Error),

    /// Store refused an edit.
    #[error("Erro ao atualizar jogo: {0:#}")]
    UpdateFailed(anyhow::Error),

    /// Store refused a removal.
    #[error("Erro ao deletar jogo: {0:#}")]
    DeleteFailed(anyhow::Error),

    /// No game with this id in the collection.
    #[error("Jogo não encontrado: {0}")]
    NotFound(String),
}

impl LibraryError {
    /// Whether trying the same operation again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LibraryError::AddFailed(_) | LibraryError::UpdateFailed(_) | LibraryError::DeleteFailed(_)
        )
    }
}

/// Failures while writing a ranking export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Nothing to export for the selected mode.
    #[error("Nenhum jogo para exportar neste ranking")]
    Empty,

    /// Covers could not be embedded and the image-free retry failed too.
    #[error(
        "Erro ao exportar imagem. As imagens dos jogos podem estar bloqueadas ({hosts}). \
         Tente usar jogos com imagens hospedadas localmente. Causa: {cause:#}"
    )]
    ImagesUnavailable {
        /// Hosts whose covers failed to download.
        hosts: String,
        /// Error of the image-free attempt.
        cause: anyhow::Error,
    },

    /// The document could not be written.
    #[error("Erro ao salvar {}: {source}", path.display())]
    Write {
        /// Target file.
        path: PathBuf,
        /// Underlying IO failure.
        source: std::io::Error,
    },
}

/// Result alias for collection mutations.
pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
