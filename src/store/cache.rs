//! Prefetching page cache for large files
//!
//! Keeps the pages around the one on screen ready before they are asked
//! for, so sequential paging overlaps disk reads with the user reading.
//!
//! # Slots
//!
//! ```text
//!  first   prev_prev  previous  [current]  next  next_next   last
//!   [0,P)  [S-2P,S-P) [S-P,S)   [S,S+P)  [S+P,..) [S+2P,..)  [L,total)
//! ```
//!
//! `first` and `last` are filled once by the populate task. After every
//! request one refresh task rotates the neighbour slots in the direction of
//! travel and reads exactly one new range from the file.
//!
//! # Concurrency
//!
//! At most one background task (populate or refresh) exists at a time. Every
//! request joins it before reading a slot, so the foreground never observes
//! a half-rotated cache, and a task failure is re-raised by that join. The
//! single `FileCursor` is shared behind a mutex and only the running task
//! holds it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use super::cursor::FileCursor;
use super::error::StoreError;
use super::navigation::PageWindow;
use super::page::{Page, PageRole};
use super::source::PageSource;

/// Cache storage locations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    First,
    PrevPrev,
    Previous,
    Current,
    Next,
    NextNext,
    Last,
}

/// Counters for observing cache behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests served straight from a slot
    pub hits: usize,
    /// Requests that had to read the file in the foreground
    pub misses: usize,
    /// Range reads issued by refresh tasks
    pub refresh_reads: usize,
}

#[derive(Debug, Default)]
struct Slots {
    first: Page,
    prev_prev: Page,
    previous: Page,
    current: Page,
    next: Page,
    next_next: Page,
    last: Page,
    refresh_reads: usize,
}

impl Slots {
    fn get(&self, slot: Slot) -> &Page {
        match slot {
            Slot::First => &self.first,
            Slot::PrevPrev => &self.prev_prev,
            Slot::Previous => &self.previous,
            Slot::Current => &self.current,
            Slot::Next => &self.next,
            Slot::NextNext => &self.next_next,
            Slot::Last => &self.last,
        }
    }

    /// Apply a refresh: the page just served plus one fresh read
    fn rotate(&mut self, motion: Motion, served: Page, fresh: Page, page_size: usize) {
        let start = served.start;
        match motion {
            Motion::First => {
                let (next, next_next) = fresh.split_at(page_size);
                self.prev_prev = Page::empty(0);
                self.previous = Page::empty(0);
                self.next = next;
                self.next_next = next_next;
            }
            Motion::Previous => {
                self.next_next = std::mem::take(&mut self.next);
                self.next = std::mem::take(&mut self.current);
                self.previous = std::mem::take(&mut self.prev_prev);
                self.prev_prev = fresh;
            }
            Motion::Next => {
                self.prev_prev = std::mem::take(&mut self.previous);
                self.previous = std::mem::take(&mut self.current);
                self.next = std::mem::take(&mut self.next_next);
                self.next_next = fresh;
            }
            Motion::Last => {
                let before = fresh.len().saturating_sub(page_size);
                let (prev_prev, previous) = fresh.split_at(before);
                self.prev_prev = prev_prev;
                self.previous = previous;
                self.next = Page::empty(start);
                self.next_next = Page::empty(start);
            }
            Motion::Recentre => {
                // fresh spans [start - 2P, end + 2P), clamped to the file
                let before = start - fresh.start;
                let (head, rest) = fresh.split_at(before);
                let (prev_prev, previous) = head.split_at(before.saturating_sub(page_size));
                let (_, after) = rest.split_at(served.len());
                let (next, next_next) = after.split_at(page_size);
                self.prev_prev = prev_prev;
                self.previous = previous;
                self.next = next;
                self.next_next = next_next;
            }
        }
        self.current = served;
        self.refresh_reads += 1;
    }
}

/// Direction of travel a refresh rotates for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    First,
    Previous,
    Next,
    Last,
    /// Arrived somewhere the neighbour slots do not describe
    Recentre,
}

impl Motion {
    /// The single range a refresh reads for a page served at `start`
    ///
    /// Reads never reach below `floor`, the first index of the section.
    fn fresh_range(
        self,
        start: usize,
        len: usize,
        page_size: usize,
        floor: usize,
    ) -> (usize, usize) {
        match self {
            Motion::First => (start + page_size, 2 * page_size),
            Motion::Previous => match start.checked_sub(2 * page_size) {
                Some(lo) if lo >= floor => (lo, page_size),
                _ => (floor, 0),
            },
            Motion::Next => (start + 2 * page_size, page_size),
            Motion::Last => {
                let lo = start.saturating_sub(2 * page_size).max(floor);
                (lo, start - lo)
            }
            Motion::Recentre => {
                let lo = start.saturating_sub(2 * page_size).max(floor);
                (lo, start - lo + len + 2 * page_size)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskKind {
    Populate,
    Refresh,
}

struct Task {
    kind: TaskKind,
    handle: JoinHandle<Result<(), StoreError>>,
    cancel: Arc<AtomicBool>,
}

/// Six-slot two-ahead page cache over a forward-only file cursor
pub struct PrefetchCache {
    cursor: Arc<Mutex<FileCursor>>,
    slots: Arc<Mutex<Slots>>,
    /// First index of the span being paged
    base: usize,
    /// One past the last index of the span being paged
    total: usize,
    page_size: usize,
    task: Option<Task>,
    hits: usize,
    misses: usize,
}

impl PrefetchCache {
    /// Create the cache and schedule the populate task
    pub fn start(cursor: FileCursor, total: usize, page_size: usize) -> Result<Self, StoreError> {
        let mut cache = Self {
            cursor: Arc::new(Mutex::new(cursor)),
            slots: Arc::new(Mutex::new(Slots::default())),
            base: 0,
            total,
            page_size: page_size.max(1),
            task: None,
            hits: 0,
            misses: 0,
        };
        cache.spawn_populate()?;
        Ok(cache)
    }

    /// `(base, total)`: the index range being paged
    pub fn span(&self) -> (usize, usize) {
        (self.base, self.total)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Serve the page for `role` at `window`, then refresh in the background
    pub fn request(&mut self, role: PageRole, window: &PageWindow) -> Result<Page, StoreError> {
        self.settle()?;

        let (start, len) = (window.start, window.page_size);
        if len == 0 {
            return Ok(Page::empty(start));
        }

        let role = self.route(role, start);
        let slot = match role {
            PageRole::First => Slot::First,
            PageRole::Previous => Slot::Previous,
            PageRole::Next => Slot::Next,
            PageRole::Last => Slot::Last,
        };

        let motion = match role {
            PageRole::First => Motion::First,
            PageRole::Previous => Motion::Previous,
            PageRole::Next => Motion::Next,
            PageRole::Last => Motion::Last,
        };

        self.serve(&[slot], motion, start, len)
    }

    /// Serve `window` without a navigation step, re-centring the neighbours
    pub fn request_window(&mut self, window: &PageWindow) -> Result<Page, StoreError> {
        self.settle()?;

        let (start, len) = (window.start, window.page_size);
        if len == 0 {
            return Ok(Page::empty(start));
        }

        self.serve(
            &[Slot::Current, Slot::First, Slot::Last],
            Motion::Recentre,
            start,
            len,
        )
    }

    /// Drop all cached pages and populate again for `page_size`
    pub fn repopulate(&mut self, page_size: usize) -> Result<(), StoreError> {
        self.page_size = page_size.max(1);
        self.restart()
    }

    /// Page `[base, total)` instead, e.g. another section of the file
    pub fn select_span(&mut self, base: usize, total: usize) -> Result<(), StoreError> {
        self.base = base;
        self.total = total.max(base);
        self.restart()
    }

    fn restart(&mut self) -> Result<(), StoreError> {
        if let Some(task) = self.task.take() {
            task.cancel.store(true, Ordering::Release);
            if let Err(e) = join(task) {
                tracing::warn!("discarding failed prefetch task before repopulate: {}", e);
            }
        }

        *lock(&self.slots)? = Slots::default();
        self.spawn_populate()
    }

    /// Block until the in-flight task (if any) has finished
    pub fn settle(&mut self) -> Result<(), StoreError> {
        match self.task.take() {
            Some(task) => join(task),
            None => Ok(()),
        }
    }

    /// Whether no background task is running
    pub fn is_settled(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.handle.is_finished())
    }

    /// Whether the populate task is still running
    pub fn is_populating(&self) -> bool {
        self.task
            .as_ref()
            .is_some_and(|t| t.kind == TaskKind::Populate && !t.handle.is_finished())
    }

    /// Copy of a slot's page, after waiting for the in-flight task
    pub fn slot(&mut self, slot: Slot) -> Result<Page, StoreError> {
        self.settle()?;
        Ok(lock(&self.slots)?.get(slot).clone())
    }

    pub fn stats(&self) -> CacheStats {
        let refresh_reads = self.slots.lock().map(|s| s.refresh_reads).unwrap_or(0);
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            refresh_reads,
        }
    }

    /// Send edge requests to the `first`/`last` slots
    fn route(&self, role: PageRole, start: usize) -> PageRole {
        match role {
            PageRole::Previous if start < self.base + self.page_size => PageRole::First,
            PageRole::Next if start + self.page_size >= self.total => PageRole::Last,
            other => other,
        }
    }

    fn serve(
        &mut self,
        candidates: &[Slot],
        motion: Motion,
        start: usize,
        len: usize,
    ) -> Result<Page, StoreError> {
        let cached = {
            let slots = lock(&self.slots)?;
            candidates
                .iter()
                .map(|&slot| slots.get(slot))
                .find(|page| page.covers(start, len))
                .cloned()
        };

        let (page, motion) = match cached {
            Some(page) => {
                self.hits += 1;
                (page, motion)
            }
            None => {
                self.misses += 1;
                tracing::debug!(start, len, ?motion, "prefetch miss, reading in foreground");
                let page = lock(&self.cursor)?.read_range(start, len)?;
                // The neighbours describe some other position
                (page, Motion::Recentre)
            }
        };

        self.spawn_refresh(motion, page.clone())?;
        Ok(page)
    }

    fn spawn_populate(&mut self) -> Result<(), StoreError> {
        let cursor = Arc::clone(&self.cursor);
        let slots = Arc::clone(&self.slots);
        let (base, total, page_size) = (self.base, self.total, self.page_size);

        self.spawn(TaskKind::Populate, move |cancel| {
            let started = Instant::now();
            let last_start = PageWindow::section(base, total, page_size).last_page_start();

            let (first, last) = {
                let mut cursor = lock(&cursor)?;
                let first = cursor.read_range(base, page_size.min(total - base))?;
                let last = cursor.read_range(last_start, total - last_start)?;
                (first, last)
            };

            if cancel.load(Ordering::Acquire) {
                return Ok(());
            }

            let mut slots = lock(&slots)?;
            slots.first = first;
            slots.last = last;
            tracing::debug!(
                base,
                total,
                page_size,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "prefetch cache populated"
            );
            Ok(())
        })
    }

    fn spawn_refresh(&mut self, motion: Motion, served: Page) -> Result<(), StoreError> {
        let cursor = Arc::clone(&self.cursor);
        let slots = Arc::clone(&self.slots);
        let (base, total, page_size) = (self.base, self.total, self.page_size);

        self.spawn(TaskKind::Refresh, move |cancel| {
            let (lo, count) = motion.fresh_range(served.start, served.len(), page_size, base);
            // A section ends before EOF, so reads stop at the span's end
            let count = count.min(total.saturating_sub(lo));
            let fresh = if count == 0 {
                Page::empty(lo)
            } else {
                lock(&cursor)?.read_range(lo, count)?
            };

            if cancel.load(Ordering::Acquire) {
                return Ok(());
            }

            tracing::trace!(?motion, start = served.start, lo, count, "prefetch refresh");
            lock(&slots)?.rotate(motion, served, fresh, page_size);
            Ok(())
        })
    }

    fn spawn<F>(&mut self, kind: TaskKind, work: F) -> Result<(), StoreError>
    where
        F: FnOnce(&AtomicBool) -> Result<(), StoreError> + Send + 'static,
    {
        // Single flight: callers settle first, this is the backstop
        self.settle()?;

        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let handle = thread::Builder::new()
            .name("logview-prefetch".to_string())
            .spawn(move || work(&flag))
            .map_err(StoreError::io)?;

        self.task = Some(Task {
            kind,
            handle,
            cancel,
        });
        Ok(())
    }
}

impl PageSource for PrefetchCache {
    fn fetch(&mut self, role: PageRole, window: &PageWindow) -> Result<Page, StoreError> {
        self.request(role, window)
    }

    fn refetch(&mut self, window: &PageWindow) -> Result<Page, StoreError> {
        self.request_window(window)
    }

    fn repopulate(&mut self, page_size: usize) -> Result<(), StoreError> {
        PrefetchCache::repopulate(self, page_size)
    }

    fn settle(&mut self) -> Result<(), StoreError> {
        PrefetchCache::settle(self)
    }

    fn is_reading(&self) -> bool {
        self.is_populating()
    }

    fn as_prefetch(&self) -> Option<&PrefetchCache> {
        Some(self)
    }

    fn as_prefetch_mut(&mut self) -> Option<&mut PrefetchCache> {
        Some(self)
    }
}

impl Drop for PrefetchCache {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel.store(true, Ordering::Release);
            let _ = task.handle.join();
        }
        if let Ok(mut cursor) = self.cursor.lock() {
            cursor.close();
        }
    }
}

fn join(task: Task) -> Result<(), StoreError> {
    task.handle.join().map_err(|_| {
        StoreError::Background(format!("{:?} task panicked", task.kind).to_lowercase())
    })?
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Background("prefetch state poisoned".to_string()))
}
