//! Frame-by-frame playback of a timeline.

use std::io::Read;

use super::cancel::CancelToken;
use super::classify::{DisplayCategory, classify};
use super::pace::PaceProvider;
use super::projection::{Projection, Viewport};
use super::surface::PresentationSurface;
use crate::schema::PlaybackConfig;
use crate::trajectory::{RawBody, SnapshotStats, TrajectoryError, TrajectoryReader};

/// Errors that end a playback run.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),
    #[error("Reader already advanced to cycle {next_cycle}; playback needs a fresh reader")]
    ReaderAdvanced { next_cycle: u64 },
}

/// Lifecycle of a playback run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Running,
    Finished,
    Cancelled,
    Failed,
}

impl PlaybackState {
    /// Whether the run can produce no more frames.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PlaybackState::Finished | PlaybackState::Cancelled | PlaybackState::Failed
        )
    }
}

/// One visible body projected into viewport space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectedPoint {
    /// Identity index of the body within every snapshot.
    pub body: usize,
    pub pixel_x: i32,
    pub pixel_y: i32,
    pub category: DisplayCategory,
}

/// A render-ready cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub cycle_index: u64,
    /// Visible bodies in identity order.
    pub points: Vec<ProjectedPoint>,
    pub visible_count: usize,
    /// Mass and presence summary of the whole snapshot.
    pub stats: SnapshotStats,
}

impl Frame {
    /// Number of visible bodies per category, indexed by
    /// [`DisplayCategory::index`].
    pub fn category_counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for point in &self.points {
            counts[point.category.index()] += 1;
        }
        counts
    }
}

/// How a run ended.
#[derive(Debug)]
pub struct PlaybackOutcome {
    pub state: PlaybackState,
    /// Frames handed to the consumer.
    pub frames: u64,
    pub error: Option<PlaybackError>,
}

/// Builds playback runs.
#[derive(Debug, Clone)]
pub struct PlaybackEngine {
    space_border: f64,
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::new(&PlaybackConfig::default())
    }
}

impl PlaybackEngine {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            space_border: config.space_border,
        }
    }

    /// Start a run over `reader`.
    ///
    /// The reader is consumed and must not have been read yet. The returned
    /// run yields frames lazily; dropping it ends playback.
    pub fn start<R: Read, P: PaceProvider>(
        &self,
        reader: TrajectoryReader<R>,
        viewport: Viewport,
        pace: P,
        cancel: CancelToken,
    ) -> Result<PlaybackRun<R, P>, PlaybackError> {
        Ok(PlaybackRun {
            playhead: Playhead::new(reader, viewport, self.space_border, cancel)?,
            pace,
        })
    }

    /// Play a whole timeline onto a presentation surface.
    ///
    /// Viewport and pace are read from the surface before every frame.
    pub fn play<R: Read, S: PresentationSurface + ?Sized>(
        &self,
        reader: TrajectoryReader<R>,
        surface: &mut S,
        cancel: CancelToken,
    ) -> PlaybackOutcome {
        let viewport = surface.viewport();
        let mut playhead = match Playhead::new(reader, viewport, self.space_border, cancel) {
            Ok(playhead) => playhead,
            Err(e) => {
                log::warn!("Playback rejected: {}", e);
                let outcome = PlaybackOutcome {
                    state: PlaybackState::Failed,
                    frames: 0,
                    error: Some(e),
                };
                surface.finish(&outcome);
                return outcome;
            }
        };

        surface.begin(playhead.cycle_count, playhead.reader.body_count());
        let mut error = None;
        loop {
            playhead.viewport = surface.viewport();
            let pace = || surface.frame_delay();
            match playhead.step(&pace) {
                Some(Ok(frame)) => surface.present(frame),
                Some(Err(e)) => error = Some(e),
                None => break,
            }
        }

        let outcome = PlaybackOutcome {
            state: playhead.state,
            frames: playhead.emitted,
            error,
        };
        surface.finish(&outcome);
        outcome
    }
}

/// A single pass over a timeline, yielding one [`Frame`] per cycle.
///
/// Frame `n + 1` is not decoded until frame `n` has been taken and the
/// pacing delay after it has elapsed.
pub struct PlaybackRun<R, P> {
    playhead: Playhead<R>,
    pace: P,
}

impl<R: Read, P: PaceProvider> PlaybackRun<R, P> {
    pub fn state(&self) -> PlaybackState {
        self.playhead.state
    }

    /// Total cycles in the timeline, for progress displays.
    pub fn cycle_count(&self) -> u64 {
        self.playhead.cycle_count
    }

    pub fn body_count(&self) -> usize {
        self.playhead.reader.body_count()
    }

    /// Frames emitted so far.
    pub fn frames_emitted(&self) -> u64 {
        self.playhead.emitted
    }

    pub fn viewport(&self) -> Viewport {
        self.playhead.viewport
    }

    /// Change the viewport used for the following frames.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.playhead.viewport = viewport;
    }
}

impl<R: Read, P: PaceProvider> Iterator for PlaybackRun<R, P> {
    type Item = Result<Frame, PlaybackError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.playhead.step(&self.pace)
    }
}

struct Playhead<R> {
    reader: TrajectoryReader<R>,
    viewport: Viewport,
    space_border: f64,
    cancel: CancelToken,
    state: PlaybackState,
    cycle_count: u64,
    emitted: u64,
    bodies: Vec<RawBody>,
}

impl<R: Read> Playhead<R> {
    fn new(
        reader: TrajectoryReader<R>,
        viewport: Viewport,
        space_border: f64,
        cancel: CancelToken,
    ) -> Result<Self, PlaybackError> {
        if reader.next_cycle() != 0 {
            return Err(PlaybackError::ReaderAdvanced {
                next_cycle: reader.next_cycle(),
            });
        }

        Ok(Self {
            cycle_count: reader.cycle_count(),
            bodies: Vec::new(),
            reader,
            viewport,
            space_border,
            cancel,
            state: PlaybackState::Idle,
            emitted: 0,
        })
    }

    fn transition(&mut self, state: PlaybackState) {
        if self.state != state {
            log::debug!("Playback {:?} -> {:?}", self.state, state);
            self.state = state;
        }
        if state.is_terminal() {
            log::info!(
                "Playback {:?} after {} of {} cycles",
                state,
                self.emitted,
                self.cycle_count
            );
        }
    }

    fn step(&mut self, pace: &dyn PaceProvider) -> Option<Result<Frame, PlaybackError>> {
        match self.state {
            PlaybackState::Finished | PlaybackState::Cancelled | PlaybackState::Failed => {
                return None;
            }
            PlaybackState::Idle => self.transition(PlaybackState::Running),
            PlaybackState::Running => {}
        }

        // A run that has emitted every cycle is finished even if a cancel
        // arrived after the last frame.
        if self.emitted >= self.cycle_count {
            self.transition(PlaybackState::Finished);
            return None;
        }
        if self.cancel.is_cancelled() {
            self.transition(PlaybackState::Cancelled);
            return None;
        }

        if self.emitted > 0 && self.cancel.wait_timeout(pace.frame_delay()) {
            self.transition(PlaybackState::Cancelled);
            return None;
        }

        let cycle = self.emitted;
        if let Err(e) = self.reader.read_snapshot_into(cycle, &mut self.bodies) {
            log::warn!("Playback failed at cycle {}: {}", cycle, e);
            self.transition(PlaybackState::Failed);
            return Some(Err(e.into()));
        }

        let frame = self.project(cycle);
        self.emitted += 1;
        log::trace!(
            "Frame {} with {} visible bodies",
            frame.cycle_index,
            frame.visible_count
        );
        Some(Ok(frame))
    }

    fn project(&self, cycle: u64) -> Frame {
        let projection = Projection::new(self.viewport, self.space_border);
        let points: Vec<ProjectedPoint> = self
            .bodies
            .iter()
            .enumerate()
            .filter(|(_, body)| body.is_present())
            .map(|(body, raw)| {
                let (pixel_x, pixel_y) = projection.project(raw.x, raw.y);
                ProjectedPoint {
                    body,
                    pixel_x,
                    pixel_y,
                    category: classify(raw.mass),
                }
            })
            .collect();

        Frame {
            cycle_index: cycle,
            visible_count: points.len(),
            points,
            stats: SnapshotStats::from_bodies(&self.bodies),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{FixedDelay, PaceControl};
    use crate::trajectory::encode_timeline;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::io::Cursor;
    use std::rc::Rc;
    use std::thread;
    use std::time::{Duration, Instant};

    type MemReader = TrajectoryReader<Cursor<Vec<u8>>>;

    fn reader_for(body_count: u32, cycles: &[Vec<RawBody>]) -> MemReader {
        let bytes = encode_timeline(body_count, cycles).unwrap();
        TrajectoryReader::from_reader(Cursor::new(bytes)).unwrap()
    }

    fn orbit(cycles: usize) -> MemReader {
        let snapshots: Vec<Vec<RawBody>> = (0..cycles as i32)
            .map(|n| {
                vec![
                    RawBody::new(0, 0, 2_000_000),
                    RawBody::new(1000 * n, -500 * n, 2000),
                    if n % 2 == 0 {
                        RawBody::new(n, n, 6)
                    } else {
                        RawBody::ABSENT
                    },
                ]
            })
            .collect();
        reader_for(3, &snapshots)
    }

    fn start<P: PaceProvider>(
        reader: MemReader,
        pace: P,
        cancel: CancelToken,
    ) -> PlaybackRun<Cursor<Vec<u8>>, P> {
        PlaybackEngine::default()
            .start(reader, Viewport::new(800, 600), pace, cancel)
            .unwrap()
    }

    #[test]
    fn test_absent_bodies_are_skipped() {
        let reader = reader_for(2, &[vec![RawBody::new(0, 0, -5), RawBody::new(0, 0, 500)]]);
        let frames: Vec<Frame> = start(reader, FixedDelay::default(), CancelToken::new())
            .map(|f| f.unwrap())
            .collect();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].visible_count, 1);
        assert_eq!(frames[0].points.len(), 1);
        assert_eq!(frames[0].points[0].body, 1);
        assert_eq!(frames[0].points[0].category, DisplayCategory::Light);
        assert_eq!((frames[0].points[0].pixel_x, frames[0].points[0].pixel_y), (300, 300));
    }

    #[test]
    fn test_header_only_finishes_immediately() {
        let reader =
            TrajectoryReader::from_reader(Cursor::new(3i32.to_le_bytes().to_vec())).unwrap();
        let mut run = start(reader, FixedDelay::default(), CancelToken::new());
        assert_eq!(run.state(), PlaybackState::Idle);
        assert_eq!(run.cycle_count(), 0);
        assert!(run.next().is_none());
        assert_eq!(run.state(), PlaybackState::Finished);
        assert_eq!(run.frames_emitted(), 0);
    }

    #[test]
    fn test_header_only_huge_body_count_finishes() {
        let bytes = i32::MAX.to_le_bytes().to_vec();
        let reader = TrajectoryReader::from_reader(Cursor::new(bytes)).unwrap();
        let mut run = start(reader, FixedDelay::default(), CancelToken::new());
        assert_eq!(run.cycle_count(), 0);
        assert!(run.next().is_none());
        assert_eq!(run.state(), PlaybackState::Finished);
    }

    #[test]
    fn test_cancel_after_last_frame_still_finishes() {
        let cancel = CancelToken::new();
        let mut run = start(orbit(2), FixedDelay::default(), cancel.clone());
        run.next().unwrap().unwrap();
        run.next().unwrap().unwrap();
        cancel.cancel();

        assert!(run.next().is_none());
        assert_eq!(run.state(), PlaybackState::Finished);
        assert_eq!(run.frames_emitted(), 2);
    }

    #[test]
    fn test_cycle_indices_are_contiguous() {
        let mut run = start(orbit(6), FixedDelay::default(), CancelToken::new());
        let mut indices = Vec::new();
        while let Some(frame) = run.next() {
            let frame = frame.unwrap();
            assert_eq!(run.state(), PlaybackState::Running);
            indices.push(frame.cycle_index);
        }
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(run.state(), PlaybackState::Finished);
        assert!(run.next().is_none());
    }

    #[test]
    fn test_frame_contents() {
        let mut run = start(orbit(2), FixedDelay::default(), CancelToken::new());

        let first = run.next().unwrap().unwrap();
        assert_eq!(first.visible_count, 3);
        assert_eq!(first.category_counts(), [1, 1, 1]);
        assert_eq!(first.stats.total_mass, 2_002_006);
        assert_eq!(first.stats.heaviest, Some(2_000_000));
        assert_eq!(
            first.points.iter().map(|p| p.body).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );

        let second = run.next().unwrap().unwrap();
        assert_eq!(second.visible_count, 2);
        assert_eq!(second.category_counts(), [1, 1, 0]);
        assert_eq!(second.stats.absent, 1);
        // 1000 / 18022.4 * 300 = 16.65 -> 17; -500 -> -8.32 -> -8.
        assert_eq!((second.points[1].pixel_x, second.points[1].pixel_y), (317, 292));
    }

    #[test]
    fn test_viewport_change_applies_to_next_frame() {
        let mut run = start(orbit(2), FixedDelay::default(), CancelToken::new());
        let first = run.next().unwrap().unwrap();
        assert_eq!((first.points[0].pixel_x, first.points[0].pixel_y), (300, 300));

        run.set_viewport(Viewport::new(300, 200));
        let second = run.next().unwrap().unwrap();
        assert_eq!((second.points[0].pixel_x, second.points[0].pixel_y), (100, 100));
    }

    #[test]
    fn test_cancel_after_frame() {
        for k in 0..4u64 {
            let cancel = CancelToken::new();
            let mut run = start(orbit(6), FixedDelay::default(), cancel.clone());
            let mut frames = 0;
            while let Some(frame) = run.next() {
                let frame = frame.unwrap();
                frames += 1;
                if frame.cycle_index == k {
                    cancel.cancel();
                }
            }
            assert_eq!(frames, k + 1);
            assert_eq!(run.state(), PlaybackState::Cancelled);
        }
    }

    #[test]
    fn test_cancel_during_pacing_wait() {
        let cancel = CancelToken::new();
        let mut run = start(orbit(4), FixedDelay(Duration::from_secs(60)), cancel.clone());
        assert!(run.next().unwrap().is_ok());

        let remote = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });

        let start = Instant::now();
        assert!(run.next().is_none());
        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(run.state(), PlaybackState::Cancelled);
        assert_eq!(run.frames_emitted(), 1);
        handle.join().unwrap();
    }

    #[test]
    fn test_pace_queried_between_frames_only() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let pace = move || {
            counter.set(counter.get() + 1);
            Duration::ZERO
        };

        let run = start(orbit(5), pace, CancelToken::new());
        assert_eq!(run.count(), 5);
        // No delay before the first frame or after the last.
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_pace_changes_mid_run() {
        let control = PaceControl::new(0, 10);
        let mut run = start(orbit(3), control.clone(), CancelToken::new());
        run.next().unwrap().unwrap();

        control.set_pace(10);
        let start = Instant::now();
        run.next().unwrap().unwrap();
        run.next().unwrap().unwrap();
        assert!(start.elapsed() < Duration::from_millis(90));
    }

    #[test]
    fn test_truncated_stream_fails() {
        let cycles = vec![vec![RawBody::new(0, 0, 10)]; 2];
        let bytes = encode_timeline(1, &cycles).unwrap();
        let reader = TrajectoryReader::with_len(Cursor::new(bytes), 4 + 12 * 3).unwrap();

        let mut run = start(reader, FixedDelay::default(), CancelToken::new());
        assert!(run.next().unwrap().is_ok());
        assert!(run.next().unwrap().is_ok());
        match run.next() {
            Some(Err(PlaybackError::Trajectory(TrajectoryError::UnexpectedEof {
                cycle, offset, ..
            }))) => {
                assert_eq!(cycle, 2);
                assert_eq!(offset, 4 + 24);
            }
            other => panic!("expected UnexpectedEof, got {:?}", other),
        }
        assert_eq!(run.state(), PlaybackState::Failed);
        assert!(run.next().is_none());
        assert_eq!(run.frames_emitted(), 2);
    }

    #[test]
    fn test_rejects_advanced_reader() {
        let mut reader = orbit(3);
        reader.read_snapshot(0).unwrap();
        let result = PlaybackEngine::default().start(
            reader,
            Viewport::default(),
            FixedDelay::default(),
            CancelToken::new(),
        );
        assert!(matches!(
            result,
            Err(PlaybackError::ReaderAdvanced { next_cycle: 1 })
        ));
    }

    #[derive(Default)]
    struct RecordingSurface {
        viewport: Option<Viewport>,
        began: Option<(u64, usize)>,
        frames: Vec<Frame>,
        finished: Option<PlaybackState>,
        cancel_after: Option<(u64, CancelToken)>,
    }

    impl PresentationSurface for RecordingSurface {
        fn viewport(&self) -> Viewport {
            self.viewport.unwrap_or_default()
        }

        fn frame_delay(&self) -> Duration {
            Duration::ZERO
        }

        fn begin(&mut self, cycle_count: u64, body_count: usize) {
            self.began = Some((cycle_count, body_count));
        }

        fn present(&mut self, frame: Frame) {
            if let Some((k, cancel)) = &self.cancel_after {
                if frame.cycle_index == *k {
                    cancel.cancel();
                }
            }
            self.frames.push(frame);
        }

        fn finish(&mut self, outcome: &PlaybackOutcome) {
            self.finished = Some(outcome.state);
        }
    }

    #[test]
    fn test_play_onto_surface() {
        let mut surface = RecordingSurface::default();
        let outcome = PlaybackEngine::default().play(orbit(4), &mut surface, CancelToken::new());

        assert_eq!(outcome.state, PlaybackState::Finished);
        assert_eq!(outcome.frames, 4);
        assert!(outcome.error.is_none());
        assert_eq!(surface.began, Some((4, 3)));
        assert_eq!(surface.frames.len(), 4);
        assert_eq!(surface.finished, Some(PlaybackState::Finished));
    }

    #[test]
    fn test_play_cancelled_from_surface() {
        let cancel = CancelToken::new();
        let mut surface = RecordingSurface {
            cancel_after: Some((1, cancel.clone())),
            ..Default::default()
        };
        let outcome = PlaybackEngine::default().play(orbit(5), &mut surface, cancel);

        assert_eq!(outcome.state, PlaybackState::Cancelled);
        assert_eq!(outcome.frames, 2);
        assert_eq!(surface.finished, Some(PlaybackState::Cancelled));
    }

    #[test]
    fn test_play_reports_failure() {
        let bytes = encode_timeline(1, &[vec![RawBody::new(0, 0, 1)]]).unwrap();
        let reader = TrajectoryReader::with_len(Cursor::new(bytes), 4 + 12 * 2).unwrap();
        let mut surface = RecordingSurface::default();
        let outcome = PlaybackEngine::default().play(reader, &mut surface, CancelToken::new());

        assert_eq!(outcome.state, PlaybackState::Failed);
        assert_eq!(outcome.frames, 1);
        assert!(matches!(
            outcome.error,
            Some(PlaybackError::Trajectory(TrajectoryError::UnexpectedEof { .. }))
        ));
        assert_eq!(surface.frames.len(), 1);
    }

    fn arb_body() -> impl Strategy<Value = RawBody> {
        (any::<i32>(), any::<i32>(), -3i32..3_000_000)
            .prop_map(|(x, y, mass)| RawBody::new(x, y, mass))
    }

    proptest! {
        #[test]
        fn prop_frames_hold_only_present_bodies(
            body_count in 1usize..12,
            cycles in prop::collection::vec(prop::collection::vec(arb_body(), 12), 0..6),
            width in 0u32..200_000,
            height in 0u32..200_000,
        ) {
            let cycles: Vec<Vec<RawBody>> = cycles
                .into_iter()
                .map(|mut c| { c.truncate(body_count); c })
                .collect();
            let reader = reader_for(body_count as u32, &cycles);
            let run = PlaybackEngine::default()
                .start(
                    reader,
                    Viewport::new(width, height),
                    FixedDelay::default(),
                    CancelToken::new(),
                )
                .unwrap();

            let mut expected_index = 0u64;
            for (frame, snapshot) in run.zip(cycles.iter()) {
                let frame = frame.unwrap();
                prop_assert_eq!(frame.cycle_index, expected_index);
                prop_assert_eq!(frame.visible_count, frame.points.len());
                prop_assert!(frame.visible_count <= body_count);
                let present = snapshot.iter().filter(|b| b.mass >= 0).count();
                prop_assert_eq!(frame.visible_count, present);
                prop_assert_eq!(frame.stats.present, present);
                for point in &frame.points {
                    prop_assert!(snapshot[point.body].mass >= 0);
                }
                expected_index += 1;
            }
            prop_assert_eq!(expected_index, cycles.len() as u64);
        }
    }
}
