//! End-to-end read/write timing scenarios for the reference SRAM.
//!
//! Corresponds to scenarios S4–S6 of the kernel's acceptance scenarios: a
//! full write cycle with legal timing, a write whose /WE pulse is too short,
//! and a full read cycle with legal timing.

use std::cell::Cell;
use std::rc::Rc;

use ttlsim_net::{BusMember, BusValue, Net};
use ttlsim_scheduler::Scheduler;
use ttlsim_sram::Sram;
use ttlsim_time::Timestamp;

fn harness() -> (Rc<Scheduler>, BusMember, BusMember, Net, Net, Net, Sram) {
    let scheduler = Rc::new(Scheduler::new());
    let addr_nets: Vec<Net> = (0..15).map(|_| Net::new()).collect();
    let data_nets: Vec<Net> = (0..8).map(|_| Net::new()).collect();
    let cs = Net::new();
    let oe = Net::new();
    let we = Net::new();
    let chip = Sram::reference_62256(
        scheduler.clone(),
        BusMember::new(addr_nets.clone()),
        BusMember::new(data_nets.clone()),
        cs.clone(),
        oe.clone(),
        we.clone(),
        None,
    );
    (
        scheduler,
        BusMember::new(addr_nets),
        BusMember::new(data_nets),
        cs,
        oe,
        we,
        chip,
    )
}

#[test]
fn s4_write_happy_path() {
    let (scheduler, addr, data, cs, oe, we, chip) = harness();
    let cs_hdl = cs.take_high(0).unwrap();
    let _oe_hdl = oe.take_high(0).unwrap();
    let we_hdl = we.take_high(0).unwrap();

    {
        let cs = cs.clone();
        scheduler.submit(Timestamp::from_nanos(0), move |_| {
            addr.write(312).unwrap();
            cs.take_low(cs_hdl).unwrap();
            Ok(())
        });
    }
    {
        let we = we.clone();
        scheduler.submit(Timestamp::from_nanos(80), move |_| {
            we.take_low(we_hdl).unwrap();
            data.write(42).unwrap();
            Ok(())
        });
    }
    scheduler.submit(Timestamp::from_nanos(160), move |_| {
        we.take_high(we_hdl).unwrap();
        Ok(())
    });

    while !scheduler.empty() {
        scheduler.tick().unwrap();
    }

    assert_eq!(chip.peek(312), 42);
}

#[test]
fn s5_write_pulse_too_short_raises_undefined_behavior() {
    let (scheduler, addr, data, cs, oe, we, _chip) = harness();
    let cs_hdl = cs.take_high(0).unwrap();
    let _oe_hdl = oe.take_high(0).unwrap();
    let we_hdl = we.take_high(0).unwrap();

    {
        let cs = cs.clone();
        scheduler.submit(Timestamp::from_nanos(0), move |_| {
            addr.write(312).unwrap();
            cs.take_low(cs_hdl).unwrap();
            Ok(())
        });
    }
    {
        let we = we.clone();
        scheduler.submit(Timestamp::from_nanos(80), move |_| {
            we.take_low(we_hdl).unwrap();
            data.write(42).unwrap();
            Ok(())
        });
    }
    // Only a 10ns pulse — short of the 70ns tWP minimum.
    scheduler.submit(Timestamp::from_nanos(90), move |_| {
        we.take_high(we_hdl).unwrap();
        Ok(())
    });

    let mut last_err = None;
    while !scheduler.empty() {
        if let Err(e) = scheduler.tick() {
            last_err = Some(e);
            break;
        }
    }

    let err = last_err.expect("pulse shorter than tWP must raise undefined behavior");
    assert!(err.to_string().contains("insufficient /WE low time"));
}

#[test]
fn s6_read_with_proper_delays() {
    let (scheduler, addr, data, cs, oe, we, chip) = harness();
    chip.poke(312, 42);

    let cs_hdl = cs.take_high(0).unwrap();
    let oe_hdl = oe.take_high(0).unwrap();
    let _we_hdl = we.take_high(0).unwrap();

    {
        let cs = cs.clone();
        scheduler.submit(Timestamp::from_nanos(0), move |_| {
            addr.write(312).unwrap();
            cs.take_low(cs_hdl).unwrap();
            Ok(())
        });
    }
    {
        let oe = oe.clone();
        scheduler.submit(Timestamp::from_nanos(80), move |_| {
            oe.take_low(oe_hdl).unwrap();
            Ok(())
        });
    }
    let observed = Rc::new(Cell::new(None));
    {
        let observed = observed.clone();
        let data = data.clone();
        scheduler.submit(Timestamp::from_nanos(160), move |_| {
            observed.set(data.value().value());
            Ok(())
        });
    }
    scheduler.submit(Timestamp::from_nanos(240), move |_| {
        oe.take_high(oe_hdl).unwrap();
        Ok(())
    });

    while !scheduler.empty() {
        scheduler.tick().unwrap();
    }

    assert_eq!(observed.get(), Some(42));
    assert_eq!(data.value(), BusValue::Floating);
}

#[test]
fn write_with_oe_already_low_is_undefined_behavior() {
    let (_scheduler, _addr, _data, cs, oe, we, _chip) = harness();
    let cs_hdl = cs.take_high(0).unwrap();
    let oe_hdl = oe.take_high(0).unwrap();
    let we_hdl = we.take_high(0).unwrap();

    cs.take_low(cs_hdl).unwrap();
    oe.take_low(oe_hdl).unwrap();
    let err = we.take_low(we_hdl).unwrap_err();
    assert!(err.to_string().contains("writes with /OE low are not supported"));
}

#[test]
fn oe_falling_while_we_already_low_is_also_undefined_behavior() {
    let (_scheduler, _addr, _data, cs, oe, we, _chip) = harness();
    let cs_hdl = cs.take_high(0).unwrap();
    let oe_hdl = oe.take_high(0).unwrap();
    let we_hdl = we.take_high(0).unwrap();

    cs.take_low(cs_hdl).unwrap();
    we.take_low(we_hdl).unwrap();
    let err = oe.take_low(oe_hdl).unwrap_err();
    assert!(err.to_string().contains("writes with /OE low are not supported"));
}

#[test]
fn overlapping_ready_checks_are_idempotent() {
    let (scheduler, addr, data, cs, oe, we, chip) = harness();
    chip.poke(1, 9);
    let cs_hdl = cs.take_high(0).unwrap();
    let oe_hdl = oe.take_high(0).unwrap();
    let _we_hdl = we.take_high(0).unwrap();

    // /CS and /OE both fall at the same instant as the address settles,
    // scheduling three overlapping read-ready checks that must not double
    // drive (or otherwise corrupt) the data bus.
    addr.write(1).unwrap();
    cs.take_low(cs_hdl).unwrap();
    oe.take_low(oe_hdl).unwrap();

    while !scheduler.empty() {
        scheduler.tick().unwrap();
    }

    assert_eq!(data.value(), BusValue::Value(9));
}
