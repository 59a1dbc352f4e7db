use super::{LoadIntent, PageTurn, ReadingSession, SessionError, SessionState};

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

impl ReadingSession {
    /// Next page of the chapter, or the first page of the next readable
    /// chapter from the last one.
    pub fn next_page(&mut self) -> PageTurn {
        let Some(total) = self.loaded_total() else {
            return PageTurn::NotReady;
        };
        if self.page_index + 1 < total {
            self.page_index += 1;
            self.after_navigation();
            return PageTurn::Page(self.page_index);
        }
        self.step_chapter(Direction::Forward, LoadIntent::Forward)
    }

    /// Previous page, or the last page of the previous readable chapter from
    /// the first one.
    pub fn previous_page(&mut self) -> PageTurn {
        if self.loaded_total().is_none() {
            return PageTurn::NotReady;
        }
        if self.page_index > 0 {
            self.page_index -= 1;
            self.after_navigation();
            return PageTurn::Page(self.page_index);
        }
        self.step_chapter(Direction::Backward, LoadIntent::Backward)
    }

    pub fn next_chapter(&mut self) -> PageTurn {
        self.step_chapter(Direction::Forward, LoadIntent::Jump)
    }

    pub fn previous_chapter(&mut self) -> PageTurn {
        self.step_chapter(Direction::Backward, LoadIntent::Jump)
    }

    /// Loads `index`, or the first readable chapter after it when `index` is
    /// a placeholder entry.
    pub fn jump_to_chapter(&mut self, index: usize) -> Result<usize, SessionError> {
        self.check_index(index)?;
        let target = self.first_readable_from(index).ok_or(SessionError::EmptyBook)?;
        self.start_load(target, LoadIntent::Jump);
        Ok(target)
    }

    /// Moves to the page at `fraction` (`0.0..=1.0`) of the current chapter.
    /// Returns the new page index, or `None` while no pages are loaded.
    pub fn jump_to_progress(&mut self, fraction: f32) -> Option<usize> {
        let total = self.loaded_total()?;
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let last = total - 1;
        let page = ((fraction * last as f32).round() as usize).min(last);
        self.page_index = page;
        self.after_navigation();
        Some(page)
    }

    fn loaded_total(&self) -> Option<usize> {
        if self.state != SessionState::Ready {
            return None;
        }
        self.pagination.as_ref().map(|p| p.total_pages())
    }

    fn step_chapter(&mut self, direction: Direction, intent: LoadIntent) -> PageTurn {
        let from = self.current_chapter;
        match self.readable_neighbor(from, direction) {
            Some(target) => {
                self.start_load(target, intent);
                PageTurn::Chapter(target)
            }
            None => match direction {
                Direction::Forward => PageTurn::AtEnd,
                Direction::Backward => PageTurn::AtStart,
            },
        }
    }

    // Placeholder entries are stepped over.
    fn readable_neighbor(&self, from: usize, direction: Direction) -> Option<usize> {
        match direction {
            Direction::Forward => self.first_readable_from(from.checked_add(1)?),
            Direction::Backward => (0..from).rev().find(|&i| self.is_readable(i)),
        }
    }
}
