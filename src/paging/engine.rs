//! Paging engine orchestration

use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::event::{EngineEvent, EventSink};
use super::frame::FrameTable;
use super::lru::{Candidate, EvictionPolicy, Lru};
use super::page::Page;
use super::snapshot::{FrameSnapshot, PageSnapshot};
use super::translate::translate;
use super::{FrameId, PageNumber};
use crate::error::Result;

/// Demand-paged virtual memory engine.
///
/// Owns the page table, the frame table, the logical clock, and the
/// fault/access counters. All state changes flow through [`access`],
/// [`write`], and [`ensure_resident`]; the snapshot methods are read-only.
///
/// [`access`]: PagingEngine::access
/// [`write`]: PagingEngine::write
/// [`ensure_resident`]: PagingEngine::ensure_resident
pub struct PagingEngine {
    page_size: usize,
    page_table: BTreeMap<PageNumber, Page>,
    frames: FrameTable,
    policy: Box<dyn EvictionPolicy>,
    sink: Option<Box<dyn EventSink>>,
    clock: u64,
    fault_count: u64,
    access_count: u64,
}

impl PagingEngine {
    /// Create an engine with LRU replacement.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` or `num_frames` is zero.
    pub fn new(page_size: usize, num_frames: usize) -> Self {
        Self::with_policy(page_size, num_frames, Lru)
    }

    /// Create an engine with a custom replacement policy.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` or `num_frames` is zero.
    pub fn with_policy(
        page_size: usize,
        num_frames: usize,
        policy: impl EvictionPolicy + 'static,
    ) -> Self {
        assert!(page_size > 0, "page_size must be positive");
        assert!(num_frames > 0, "num_frames must be positive");
        Self {
            page_size,
            page_table: BTreeMap::new(),
            frames: FrameTable::new(num_frames),
            policy: Box::new(policy),
            sink: None,
            clock: 0,
            fault_count: 0,
            access_count: 0,
        }
    }

    /// Subscribe an observer to engine events, replacing any prior one.
    pub fn set_event_sink(&mut self, sink: impl EventSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Read the value at a virtual address, faulting the page in if needed.
    pub fn access(&mut self, address: i64) -> Result<i64> {
        self.access_count += 1;
        let (page_number, offset) = translate(address, self.page_size)?;
        let value = self.ensure_resident_mut(page_number).read(offset);
        trace!(address, page = page_number, offset, value, "read");
        Ok(value)
    }

    /// Write a value at a virtual address, returning `(old, new)`.
    pub fn write(&mut self, address: i64, value: i64) -> Result<(i64, i64)> {
        self.access_count += 1;
        let (page_number, offset) = translate(address, self.page_size)?;
        let old = self.ensure_resident_mut(page_number).write(offset, value);
        trace!(address, page = page_number, offset, old, new = value, "write");
        self.emit(EngineEvent::Written {
            address,
            old,
            new: value,
        });
        Ok((old, value))
    }

    /// Make `page_number` resident, creating the page on first reference.
    ///
    /// Advances the logical clock by exactly one and records either a hit
    /// or a fault. Eviction reclaims the least-recently-used frame when
    /// none is free.
    pub fn ensure_resident(&mut self, page_number: PageNumber) -> &Page {
        self.ensure_resident_mut(page_number)
    }

    fn ensure_resident_mut(&mut self, page_number: PageNumber) -> &mut Page {
        self.clock += 1;
        let now = self.clock;

        let resident = self.page_table.get(&page_number).and_then(Page::frame);
        let loaded = match resident {
            Some(frame) => {
                trace!(page = page_number, frame, "hit");
                self.emit(EngineEvent::Hit {
                    page: page_number,
                    frame,
                });
                None
            }
            None => {
                self.fault_count += 1;
                debug!(page = page_number, "page fault");
                self.emit(EngineEvent::Fault { page: page_number });

                let frame = match self.frames.first_free() {
                    Some(frame) => frame,
                    None => self.evict_victim(),
                };
                self.frames.occupy(frame, page_number);
                trace!(page = page_number, frame, "loaded");
                self.emit(EngineEvent::Loaded {
                    page: page_number,
                    frame,
                });
                Some(frame)
            }
        };

        let page_size = self.page_size;
        let page = self
            .page_table
            .entry(page_number)
            .or_insert_with(|| Page::new(page_number, page_size));
        match loaded {
            Some(frame) => page.load(frame, now),
            None => page.touch(now),
        }
        page
    }

    /// Evict the policy's victim and return the freed frame.
    fn evict_victim(&mut self) -> FrameId {
        let residents: Vec<Candidate> = self
            .frames
            .occupied()
            .filter_map(|(frame, page_number)| {
                let page = self.page_table.get(&page_number)?;
                Some(Candidate {
                    page_number,
                    frame,
                    last_access: page.last_access(),
                })
            })
            .collect();

        let victim = match self.policy.select_victim(&residents) {
            Some(victim) => victim,
            // A full frame table always offers at least one candidate.
            None => unreachable!("eviction requested with no resident pages"),
        };

        debug!(
            page = victim.page_number,
            frame = victim.frame,
            last_access = victim.last_access,
            "evicting victim"
        );
        if let Some(page) = self.page_table.get_mut(&victim.page_number) {
            page.unload();
        }
        self.frames.clear(victim.frame);
        self.emit(EngineEvent::Evicted {
            page: victim.page_number,
            frame: victim.frame,
        });
        victim.frame
    }

    fn emit(&mut self, event: EngineEvent) {
        if let Some(sink) = self.sink.as_mut() {
            sink.on_event(&event);
        }
    }

    /// Frame slots in ascending index order, with resident page snapshots.
    pub fn memory_map(&self) -> Vec<FrameSnapshot> {
        self.frames
            .iter()
            .map(|(frame, page)| FrameSnapshot {
                frame,
                page: page
                    .and_then(|page_number| self.page_table.get(&page_number))
                    .map(Page::snapshot),
            })
            .collect()
    }

    /// Every page ever referenced, in ascending page-number order.
    pub fn page_table_snapshot(&self) -> Vec<PageSnapshot> {
        self.page_table.values().map(Page::snapshot).collect()
    }

    /// The page for `page_number`, if it has ever been referenced.
    pub fn page(&self, page_number: PageNumber) -> Option<&Page> {
        self.page_table.get(&page_number)
    }

    /// Read-only view of the frame slots.
    pub fn frame_table(&self) -> &FrameTable {
        &self.frames
    }

    /// Words per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of physical frames.
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Logical timestamp of the most recent request.
    pub fn logical_clock(&self) -> u64 {
        self.clock
    }

    /// Total page faults so far.
    pub fn fault_count(&self) -> u64 {
        self.fault_count
    }

    /// Total `access`/`write` calls so far.
    pub fn access_count(&self) -> u64 {
        self.access_count
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::error::Error;

    fn recording_engine(
        page_size: usize,
        num_frames: usize,
    ) -> (PagingEngine, Rc<RefCell<Vec<EngineEvent>>>) {
        let mut vm = PagingEngine::new(page_size, num_frames);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        vm.set_event_sink(move |event: &EngineEvent| sink.borrow_mut().push(*event));
        (vm, events)
    }

    /// Occupied frame slots and resident page `frame` fields must agree
    /// exactly, with no frame shared by two pages.
    fn assert_residency_bijection(vm: &PagingEngine) {
        let mut from_frames: Vec<(FrameId, PageNumber)> = vm.frame_table().occupied().collect();
        let mut from_pages: Vec<(FrameId, PageNumber)> = vm
            .page_table_snapshot()
            .iter()
            .filter_map(|page| Some((page.frame?, page.page_number)))
            .collect();
        from_frames.sort_unstable();
        from_pages.sort_unstable();
        assert_eq!(from_frames, from_pages);

        let mut frames: Vec<FrameId> = from_pages.iter().map(|&(frame, _)| frame).collect();
        frames.dedup();
        assert_eq!(frames.len(), from_pages.len());
    }

    #[test]
    fn first_reference_faults_and_repeat_hits() {
        let mut vm = PagingEngine::new(4, 4);
        vm.access(0).unwrap();
        assert_eq!(vm.fault_count(), 1);

        vm.access(1).unwrap();
        vm.access(3).unwrap();
        assert_eq!(vm.fault_count(), 1);
        assert_eq!(vm.access_count(), 3);
    }

    #[test]
    fn unwritten_cells_read_their_seeded_value() {
        let mut vm = PagingEngine::new(4, 2);
        assert_eq!(vm.access(0).unwrap(), 0);
        assert_eq!(vm.access(5).unwrap(), 5);
        assert_eq!(vm.access(1023).unwrap(), 1023);
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut vm = PagingEngine::new(4, 4);
        let (old, new) = vm.write(6, 42).unwrap();
        assert_eq!((old, new), (6, 42));
        assert_eq!(vm.access(6).unwrap(), 42);
    }

    #[test]
    fn written_data_survives_eviction() {
        let mut vm = PagingEngine::new(4, 1);
        vm.write(0, -7).unwrap();
        // Page 1 steals the only frame, evicting page 0.
        vm.access(4).unwrap();
        assert_eq!(vm.page(0).unwrap().frame(), None);
        // Reloading page 0 brings back its in-memory copy, not the seed.
        assert_eq!(vm.access(0).unwrap(), -7);
    }

    #[test]
    fn lru_scenario_with_four_frames() {
        let mut vm = PagingEngine::new(4, 4);

        for address in [0, 4, 8, 12] {
            vm.access(address).unwrap();
        }
        assert_eq!(vm.fault_count(), 4);
        assert_eq!(vm.logical_clock(), 4);
        for (page_number, frame) in [(0, 0), (1, 1), (2, 2), (3, 3)] {
            assert_eq!(vm.page(page_number).unwrap().frame(), Some(frame));
        }

        // Touch page 0 so page 1 becomes the oldest.
        vm.access(0).unwrap();
        assert_eq!(vm.fault_count(), 4);
        assert_eq!(vm.page(0).unwrap().last_access(), 5);

        // Page 4 must displace page 1 and inherit frame 1.
        vm.access(16).unwrap();
        assert_eq!(vm.fault_count(), 5);
        assert_eq!(vm.access_count(), 6);
        assert_eq!(vm.page(1).unwrap().frame(), None);
        assert_eq!(vm.page(4).unwrap().frame(), Some(1));

        let resident: Vec<Option<PageNumber>> = vm
            .memory_map()
            .into_iter()
            .map(|slot| slot.page.map(|page| page.page_number))
            .collect();
        assert_eq!(resident, vec![Some(0), Some(4), Some(2), Some(3)]);
        assert_residency_bijection(&vm);
    }

    #[test]
    fn resident_pages_never_exceed_capacity() {
        let mut vm = PagingEngine::new(2, 3);
        for address in 0..40 {
            vm.access(address).unwrap();
            let resident = vm
                .page_table_snapshot()
                .iter()
                .filter(|page| page.frame.is_some())
                .count();
            assert!(resident <= 3);
            assert_residency_bijection(&vm);
        }
    }

    #[test]
    fn miss_emits_fault_then_load() {
        let (mut vm, events) = recording_engine(4, 2);
        vm.access(0).unwrap();
        assert_eq!(
            events.borrow().as_slice(),
            &[
                EngineEvent::Fault { page: 0 },
                EngineEvent::Loaded { page: 0, frame: 0 },
            ]
        );
    }

    #[test]
    fn hit_emits_exactly_one_event() {
        let (mut vm, events) = recording_engine(4, 2);
        vm.access(0).unwrap();
        events.borrow_mut().clear();

        vm.access(1).unwrap();
        assert_eq!(
            events.borrow().as_slice(),
            &[EngineEvent::Hit { page: 0, frame: 0 }]
        );
    }

    #[test]
    fn replacement_emits_fault_evict_load() {
        let (mut vm, events) = recording_engine(4, 1);
        vm.access(0).unwrap();
        events.borrow_mut().clear();

        vm.access(4).unwrap();
        assert_eq!(
            events.borrow().as_slice(),
            &[
                EngineEvent::Fault { page: 1 },
                EngineEvent::Evicted { page: 0, frame: 0 },
                EngineEvent::Loaded { page: 1, frame: 0 },
            ]
        );
    }

    #[test]
    fn write_appends_a_written_event() {
        let (mut vm, events) = recording_engine(4, 1);
        vm.write(2, 9).unwrap();
        assert_eq!(
            events.borrow().last(),
            Some(&EngineEvent::Written {
                address: 2,
                old: 2,
                new: 9,
            })
        );
    }

    #[test]
    fn snapshots_do_not_mutate() {
        let mut vm = PagingEngine::new(4, 2);
        vm.access(0).unwrap();
        vm.write(9, 1).unwrap();

        let clock = vm.logical_clock();
        let faults = vm.fault_count();
        let accesses = vm.access_count();
        let map = vm.memory_map();
        let table = vm.page_table_snapshot();

        assert_eq!(vm.logical_clock(), clock);
        assert_eq!(vm.fault_count(), faults);
        assert_eq!(vm.access_count(), accesses);
        assert_eq!(vm.memory_map(), map);
        assert_eq!(vm.page_table_snapshot(), table);
    }

    #[test]
    fn page_table_snapshot_is_sorted_and_grows_monotonically() {
        let mut vm = PagingEngine::new(4, 2);
        for address in [20, 0, 12, 0, 20] {
            vm.access(address).unwrap();
        }
        let pages: Vec<PageNumber> = vm
            .page_table_snapshot()
            .iter()
            .map(|page| page.page_number)
            .collect();
        assert_eq!(pages, vec![0, 3, 5]);
    }

    #[test]
    fn ensure_resident_counts_a_fault_but_not_an_access() {
        let mut vm = PagingEngine::new(4, 2);
        let page = vm.ensure_resident(7);
        assert_eq!(page.frame(), Some(0));
        assert_eq!(vm.fault_count(), 1);
        assert_eq!(vm.access_count(), 0);
        assert_eq!(vm.logical_clock(), 1);
    }

    #[test]
    fn negative_address_is_an_error_but_still_counted() {
        let mut vm = PagingEngine::new(4, 2);
        assert_eq!(
            vm.access(-3),
            Err(Error::InvalidAddress { address: -3 })
        );
        assert_eq!(
            vm.write(-1, 5),
            Err(Error::InvalidAddress { address: -1 })
        );
        assert_eq!(vm.access_count(), 2);
        assert_eq!(vm.fault_count(), 0);
        assert_eq!(vm.logical_clock(), 0);
    }

    #[test]
    fn engines_are_independently_configured() {
        let mut small = PagingEngine::new(2, 1);
        let mut large = PagingEngine::new(8, 4);
        small.access(3).unwrap();
        large.access(3).unwrap();
        assert_eq!(small.page(1).unwrap().data(), &[2, 3]);
        assert_eq!(large.page(0).unwrap().data().len(), 8);
    }

    struct EvictNewest;

    impl EvictionPolicy for EvictNewest {
        fn select_victim(&self, residents: &[Candidate]) -> Option<Candidate> {
            residents
                .iter()
                .copied()
                .max_by_key(|c| (c.last_access, c.page_number))
        }
    }

    #[test]
    fn custom_policies_plug_into_the_engine() {
        let mut vm = PagingEngine::with_policy(4, 2, EvictNewest);
        vm.access(0).unwrap();
        vm.access(4).unwrap();
        // Both frames full; the most recently used resident goes.
        vm.access(8).unwrap();
        assert_eq!(vm.page(1).unwrap().frame(), None);
        assert_eq!(vm.page(0).unwrap().frame(), Some(0));
        assert_eq!(vm.page(2).unwrap().frame(), Some(1));
    }

    #[test]
    fn snapshots_serialize() {
        let mut vm = PagingEngine::new(4, 2);
        vm.access(0).unwrap();
        let json = serde_json::to_string(&vm.memory_map()).unwrap();
        let restored: Vec<FrameSnapshot> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, vm.memory_map());
    }

    #[test]
    #[should_panic(expected = "page_size must be positive")]
    fn zero_page_size_is_rejected() {
        let _ = PagingEngine::new(0, 4);
    }

    #[test]
    #[should_panic(expected = "num_frames must be positive")]
    fn zero_frames_are_rejected() {
        let _ = PagingEngine::new(4, 0);
    }
}
