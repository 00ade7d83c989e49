// Console rendering of recommendation outcomes

use std::io::{self, Write};

use crate::engine::{RecommendError, RecommendationResult};

pub const EMPTY_INPUT_NOTICE: &str = "Please type how you are feeling.";
pub const NO_PLAYLISTS_NOTICE: &str = "No Spotify playlists found for this emotion.";

pub struct ConsolePresenter<W: Write> {
    out: W,
}

impl ConsolePresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(&mut self, outcome: Result<&RecommendationResult, &RecommendError>) -> io::Result<()> {
        match outcome {
            Ok(result) => self.render_result(result)?,
            Err(RecommendError::EmptyInput) => writeln!(self.out, "{}", EMPTY_INPUT_NOTICE)?,
            Err(e) => writeln!(self.out, "Could not detect an emotion: {}", e)?,
        }
        self.out.flush()
    }

    fn render_result(&mut self, result: &RecommendationResult) -> io::Result<()> {
        writeln!(self.out, "Detected Emotion: {}", result.emotion)?;
        writeln!(self.out)?;
        writeln!(self.out, "Recommended Playlist: {}", result.profile.name)?;
        writeln!(self.out, "{}", result.profile.description)?;
        writeln!(self.out)?;

        if result.spotify_playlists.is_empty() {
            return writeln!(self.out, "{}", NO_PLAYLISTS_NOTICE);
        }

        writeln!(self.out, "Spotify Playlists:")?;
        for (i, playlist) in result.spotify_playlists.iter().enumerate() {
            writeln!(self.out, "{}. {} by {}", i + 1, playlist.name, playlist.owner)?;
            writeln!(self.out, "   Tracks: {}", playlist.total_tracks)?;
            writeln!(self.out, "   URL: {}", playlist.external_url)?;
        }
        Ok(())
    }
}
