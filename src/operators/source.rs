//! Source term: model source plus sponge-zone forcing.

use crate::boundary::{BoundaryZone, sponge_source};
use crate::grid::{Coordinates, Field};
use crate::grid_error::GridError;
use crate::physics::PhysicsModel;

/// Zero `source`, then accumulate the model source and every sponge zone.
pub fn evaluate_source(
    source: &mut Field,
    u: &Field,
    model: &dyn PhysicsModel,
    zones: &[BoundaryZone],
    coords: &Coordinates,
) -> Result<(), GridError> {
    let layout = u.layout();
    layout.check_len(source.as_slice().len())?;
    source.fill(0.0);
    if model.has_source() {
        let mut s = vec![0.0; layout.nvars()];
        layout.interior().for_each(|i| {
            model.source(u.at(i), &mut s);
            for (o, &x) in source.at_mut(i).iter_mut().zip(&s) {
                *o += x;
            }
        });
    }
    for zone in zones.iter().filter(|z| z.is_sponge()) {
        sponge_source(zone, coords, u, source)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::halo::Side;
    use crate::grid::GridLayout;
    use crate::physics::LinearAdr;

    #[test]
    fn reaction_and_sponge_accumulate() {
        let l = GridLayout::new(&[4], 1, 1).unwrap();
        let coords = Coordinates::uniform(&l, &[0], &[0.0], &[0.25]).unwrap();
        let m = LinearAdr::new(1, vec![1.0], vec![], 0.5).unwrap();
        let u = Field::uniform(&l, &[2.0]).unwrap();
        let zones = vec![BoundaryZone::Sponge {
            dim: 0,
            face: Side::Low,
            reference: vec![0.0],
            xmin: vec![0.0],
            xmax: vec![0.25],
            strength: 1.0,
        }];
        let mut s = Field::zeros(&l);
        s.fill(99.0);
        evaluate_source(&mut s, &u, &m, &zones, &coords).unwrap();
        // x = 0.125 sits halfway through the zone.
        assert!((s.at(&[0])[0] - (-1.0 - 1.0)).abs() < 1e-12);
        assert_eq!(s.at(&[3]), &[-1.0]);
        assert_eq!(s.at(&[-1]), &[0.0]);
    }
}
