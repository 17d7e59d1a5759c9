use crate::bird::Bird;
use crate::pipe::Pipe;
use crate::sprites::Sprites;

/// Length of the feature vector fed to every controller.
pub const SENSOR_LEN: usize = 3;

/// `[y, |y - gap top|, |y - gap bottom|]` against the active pipe.
pub fn encode(bird: &Bird, pipe: &Pipe) -> [f32; SENSOR_LEN] {
    [bird.y, (bird.y - pipe.height).abs(), (bird.y - pipe.bottom).abs()]
}

/// The bird furthest along the course. All birds share one x in practice, but
/// the choice is an explicit reduction rather than list position.
pub fn lead_bird(birds: &[Bird]) -> Option<&Bird> {
    birds.iter().max_by(|a, b| a.x.total_cmp(&b.x).then(b.slot.cmp(&a.slot)))
}

/// Index of the pipe every bird senses this tick: the first one until the lead
/// bird has cleared its trailing edge, then the next.
pub fn active_pipe(birds: &[Bird], pipes: &[Pipe], sprites: &Sprites) -> Option<usize> {
    let lead = lead_bird(birds)?;
    let first = pipes.first()?;
    if pipes.len() > 1 && lead.x > first.right_edge(sprites) {
        Some(1)
    } else {
        Some(0)
    }
}
