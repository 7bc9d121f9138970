// Triangle channel tests

use crate::apu::channels::TriangleChannel;
use crate::apu::constants::TRIANGLE_SEQUENCE;

fn sounding_triangle() -> TriangleChannel {
    let mut triangle = TriangleChannel::new();
    triangle.length.set_enabled(true);
    triangle.write_control(0x7F); // linear reload 127, control clear
    triangle.write_timer_low(50);
    triangle.write_length(0x08); // load length, arm linear reload
    triangle.clock_quarter(); // linear counter picks up the reload
    triangle
}

/// Advance the sequencer one step
fn step_sequence(triangle: &mut TriangleChannel) {
    for _ in 0..=50 {
        triangle.clock_timer();
    }
}

#[test]
fn test_sequencer_walks_down_then_up() {
    let mut triangle = sounding_triangle();

    let mut outputs = Vec::new();
    for _ in 0..32 {
        step_sequence(&mut triangle);
        outputs.push(triangle.output());
    }

    // One full walk of the 32-step sequence, starting one past position 0
    let expected: Vec<u8> = (1..=32).map(|i| TRIANGLE_SEQUENCE[i % 32]).collect();
    assert_eq!(outputs, expected);
}

#[test]
fn test_sequencer_gated_by_linear_counter() {
    let mut triangle = sounding_triangle();
    step_sequence(&mut triangle);
    let position_output = triangle.output();

    // Drain the linear counter: control is clear, so it counts down
    triangle.write_control(0x00);
    for _ in 0..200 {
        triangle.clock_quarter();
    }
    assert!(!triangle.linear.is_active());

    step_sequence(&mut triangle);
    assert_eq!(
        triangle.output(),
        position_output,
        "sequencer frozen, output holds"
    );
}

#[test]
fn test_sequencer_gated_by_length_counter() {
    // Halt is already clear (control bit 7); reload a short length and
    // keep the linear counter topped up
    let mut triangle = sounding_triangle();
    triangle.write_length(0x18); // index 3 -> 2
    triangle.clock_quarter();

    triangle.clock_half();
    triangle.clock_half();
    assert!(!triangle.length.is_active());

    let before = triangle.output();
    step_sequence(&mut triangle);
    assert_eq!(triangle.output(), before, "no stepping without length");
}
