// Terminal stand-in for the animated runner avatar. Frames advance on the
// render tick; the stride rate follows the speed score.

const FRAMES: [&str; 4] = [
    r"
      o
     /|\
     / >
    /
~~~~~~~~~~~~",
    r"
      o
     /|\
      |\
     / \
~~~~~~~~~~~~",
    r"
      o
     \|/
     < \
        \
~~~~~~~~~~~~",
    r"
      o
     /|\
     /|
    / \
~~~~~~~~~~~~",
];

pub fn frame_text(frame: usize) -> &'static str {
    FRAMES[frame % FRAMES.len()]
}

// Ticks per stride: a fast runner (speed score 100) swaps frames every tick,
// a slow one every four.
pub fn stride_interval(speed_score: u8) -> usize {
    match speed_score {
        75.. => 1,
        50..=74 => 2,
        25..=49 => 3,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_cycle() {
        assert_eq!(frame_text(0), frame_text(FRAMES.len()));
        assert_ne!(frame_text(0), frame_text(1));
    }

    #[test]
    fn faster_scores_stride_quicker() {
        assert!(stride_interval(90) < stride_interval(10));
        assert_eq!(stride_interval(75), 1);
        assert_eq!(stride_interval(0), 4);
    }
}
