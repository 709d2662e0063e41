use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use ecd::sim::SimEc;
use ecd::{Controller, Error, Handle, Ports, EC_SPACE_SIZE};

const PORTS: Ports = Ports {
    command: 0x66,
    data: 0x62,
};

fn controller(sim: &SimEc, index: usize) -> Arc<Controller<ecd::sim::SimPort>> {
    Arc::new(Controller::new(index, PORTS, sim.ec()))
}

#[test]
fn every_offset_round_trips() {
    let sim = SimEc::with_latency(2);
    let controller = controller(&sim, 0);
    let handle = Handle::new(&controller);

    for offset in 0..EC_SPACE_SIZE {
        let value = (offset as u8).wrapping_mul(31).wrapping_add(7);
        assert_eq!(handle.write(offset as u64, &[value]), Ok(1));
        assert_eq!(handle.read_vec(offset as u64, 1).unwrap(), [value]);
    }
    assert!(sim.violations().is_empty());
}

#[test]
fn offsets_past_the_end() {
    let sim = SimEc::new();
    let controller = controller(&sim, 0);
    let handle = Handle::new(&controller);

    for offset in [256, 257, 1024, u64::MAX] {
        for len in [0, 1, 300] {
            let mut buf = vec![0; len];
            assert_eq!(handle.read(offset, &mut buf), Ok(0));
            assert_eq!(handle.write(offset, &buf), Ok(0));
        }
    }
    assert_eq!(sim.transactions(), 0);
}

#[test]
fn lengths_are_clipped() {
    let sim = SimEc::new();
    let controller = controller(&sim, 0);
    let handle = Handle::new(&controller);

    for offset in [0u64, 1, 128, 200, 255] {
        let before = sim.transactions();
        let mut buf = vec![0; 400];
        let expected = EC_SPACE_SIZE - offset as usize;
        assert_eq!(handle.read(offset, &mut buf), Ok(expected));
        assert_eq!(sim.transactions() - before, expected);
    }
}

#[test]
fn same_controller_never_interleaves() {
    let sim = SimEc::with_latency(3);
    let controller = controller(&sim, 0);
    let threads = 4;
    let barrier = Arc::new(Barrier::new(threads));

    let workers: Vec<_> = (0..threads)
        .map(|t| {
            let handle = Handle::new(&controller);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let region = t as u64 * 64;
                for round in 0..20u8 {
                    let data = [round ^ t as u8; 64];
                    assert_eq!(handle.write(region, &data), Ok(64));
                    assert_eq!(handle.read_vec(region, 64).unwrap(), data);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(sim.violations(), Vec::<String>::new());
    assert_eq!(sim.transactions(), threads * 20 * 64 * 2);
}

#[test]
fn distinct_controllers_do_not_block_each_other() {
    let stuck = SimEc::new();
    stuck.set_stuck(true);
    let stuck_controller = controller(&stuck, 0);
    let healthy = SimEc::new();
    let healthy_controller = controller(&healthy, 1);

    let barrier = Arc::new(Barrier::new(2));
    let slow = {
        let handle = Handle::new(&stuck_controller);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            handle.write(0, &[0; 4])
        })
    };

    barrier.wait();
    // Give the slow caller time to take its controller's lock
    thread::sleep(Duration::from_millis(50));
    let start = Instant::now();
    let handle = Handle::new(&healthy_controller);
    assert_eq!(handle.write(0x10, &[1, 2, 3]), Ok(3));
    assert_eq!(handle.read_vec(0x10, 3).unwrap(), [1, 2, 3]);
    assert!(start.elapsed() < Duration::from_millis(500));

    assert_eq!(slow.join().unwrap(), Err(Error::Timeout));
}

#[test]
fn timeout_leaves_the_lock_available() {
    let sim = SimEc::new();
    let controller = controller(&sim, 0);
    let handle = Handle::new(&controller);
    sim.set_stuck(true);

    let start = Instant::now();
    let mut buf = [0; 8];
    assert_eq!(handle.read(0, &mut buf), Err(Error::Timeout));
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(3));

    sim.set_stuck(false);
    sim.poke(0, 0x42);
    assert_eq!(handle.read(0, &mut buf[..1]), Ok(1));
    assert_eq!(buf[0], 0x42);
}
