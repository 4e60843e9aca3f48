use super::*;

#[test]
fn staged_events_fire_only_after_merge() {
    let mut scheduler = Scheduler::new();
    scheduler.schedule(Event::Scanline, 0);

    // still staged, so nothing is due yet
    scheduler.advance(10);
    assert!(scheduler.pop_due().is_none());

    scheduler.merge();
    scheduler.advance(0);
    assert_eq!(scheduler.pop_due(), Some((Event::Scanline, 0)));
}

#[test]
fn overshoot_is_reported_when_deadline_is_skipped() {
    let mut scheduler = Scheduler::new();
    scheduler.schedule(Event::SpuSample, 5);
    scheduler.merge();

    scheduler.advance(8);
    assert_eq!(scheduler.pop_due(), Some((Event::SpuSample, -3)));
    assert!(scheduler.pop_due().is_none());
}

#[test]
fn simultaneous_events_fire_in_insertion_order() {
    let mut scheduler = Scheduler::new();
    scheduler.schedule(Event::CdromIrq(3), 4);
    scheduler.schedule(Event::SioAck(0xFF), 4);
    scheduler.schedule(Event::Scanline, 4);
    scheduler.merge();

    scheduler.advance(4);
    assert_eq!(scheduler.pop_due(), Some((Event::CdromIrq(3), 0)));
    assert_eq!(scheduler.pop_due(), Some((Event::SioAck(0xFF), 0)));
    assert_eq!(scheduler.pop_due(), Some((Event::Scanline, 0)));
}

#[test]
fn remaining_cycles_stay_non_negative() {
    let mut scheduler = Scheduler::new();
    scheduler.schedule(Event::Scanline, 100);
    scheduler.schedule(Event::SpuSample, 3);
    scheduler.merge();

    scheduler.advance(3);
    while scheduler.pop_due().is_some() {}
    scheduler.merge();

    assert_eq!(scheduler.until_next(), 97);
    assert_eq!(scheduler.len(), 1);
}

#[test]
fn retain_drops_matching_events() {
    let mut scheduler = Scheduler::new();
    scheduler.schedule(Event::CdromIrq(1), 10);
    scheduler.merge();
    scheduler.schedule(Event::CdromIrq(2), 20);
    scheduler.schedule(Event::Scanline, 30);

    scheduler.retain(|e| !matches!(e, Event::CdromIrq(_)));
    scheduler.merge();

    assert_eq!(scheduler.len(), 1);
    scheduler.advance(30);
    assert_eq!(scheduler.pop_due(), Some((Event::Scanline, 0)));
}

#[test]
#[should_panic]
fn scheduling_in_the_past_is_rejected() {
    let mut scheduler = Scheduler::new();
    scheduler.schedule(Event::Scanline, -1);
}

#[test]
fn run_cycles_is_capped_by_the_quantum() {
    let mut scheduler = Scheduler::new();
    assert_eq!(scheduler.run_cycles(), MAX_RUN_CYCLES);

    scheduler.schedule(Event::Scanline, 7);
    scheduler.merge();
    assert_eq!(scheduler.run_cycles(), 7);
}
