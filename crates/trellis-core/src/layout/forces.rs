use super::Simulation;

/// Pull linked nodes toward `link_distance`, biased by endpoint degree.
pub(super) fn apply_links(sim: &mut Simulation) {
    let distance = sim.config.link_distance;
    let alpha = sim.alpha;

    for k in 0..sim.links.len() {
        let link = sim.links[k];
        let (source, target) = (&sim.nodes[link.source], &sim.nodes[link.target]);

        let mut x = target.position.x + target.velocity.x - source.position.x - source.velocity.x;
        let mut y = target.position.y + target.velocity.y - source.position.y - source.velocity.y;
        if x == 0.0 {
            x = sim.jiggle();
        }
        if y == 0.0 {
            y = sim.jiggle();
        }

        let length = (x * x + y * y).sqrt();
        let l = (length - distance) / length * alpha * sim.link_strength[k];
        x *= l;
        y *= l;

        let bias = sim.link_bias[k];
        let target = &mut sim.nodes[link.target];
        target.velocity.x -= x * bias;
        target.velocity.y -= y * bias;
        let source = &mut sim.nodes[link.source];
        source.velocity.x += x * (1.0 - bias);
        source.velocity.y += y * (1.0 - bias);
    }
}

/// Pairwise many-body force; negative strength repels.
pub(super) fn apply_charge(sim: &mut Simulation) {
    let strength = sim.config.charge_strength;
    let distance_min2 = sim.config.charge_distance_min * sim.config.charge_distance_min;
    let alpha = sim.alpha;
    let count = sim.nodes.len();

    for i in 0..count {
        for j in 0..count {
            if i == j {
                continue;
            }

            let mut x = sim.nodes[j].position.x - sim.nodes[i].position.x;
            let mut y = sim.nodes[j].position.y - sim.nodes[i].position.y;
            if x == 0.0 {
                x = sim.jiggle();
            }
            if y == 0.0 {
                y = sim.jiggle();
            }

            let mut l = x * x + y * y;
            if l < distance_min2 {
                l = (distance_min2 * l).sqrt();
            }

            let w = strength * alpha / l;
            let node = &mut sim.nodes[i];
            node.velocity.x += x * w;
            node.velocity.y += y * w;
        }
    }
}

/// Push apart nodes whose padded radii overlap, using predicted positions.
pub(super) fn apply_collision(sim: &mut Simulation) {
    let padding = sim.config.collision_padding;
    let strength = sim.config.collision_strength;
    let count = sim.nodes.len();

    for i in 0..count {
        for j in (i + 1)..count {
            let ri = sim.nodes[i].radius + padding;
            let rj = sim.nodes[j].radius + padding;
            let r = ri + rj;

            let (a, b) = (&sim.nodes[i], &sim.nodes[j]);
            let mut x = a.position.x + a.velocity.x - b.position.x - b.velocity.x;
            let mut y = a.position.y + a.velocity.y - b.position.y - b.velocity.y;
            let mut l = x * x + y * y;
            if l >= r * r {
                continue;
            }

            if x == 0.0 {
                x = sim.jiggle();
                l += x * x;
            }
            if y == 0.0 {
                y = sim.jiggle();
                l += y * y;
            }

            let length = l.sqrt();
            let push = (r - length) / length * strength;
            x *= push;
            y *= push;

            let share = (rj * rj) / (ri * ri + rj * rj);
            let a = &mut sim.nodes[i];
            a.velocity.x += x * share;
            a.velocity.y += y * share;
            let b = &mut sim.nodes[j];
            b.velocity.x -= x * (1.0 - share);
            b.velocity.y -= y * (1.0 - share);
        }
    }
}

/// Translate the layout so its mean position sits on the viewport center.
pub(super) fn apply_centering(sim: &mut Simulation) {
    if sim.nodes.is_empty() {
        return;
    }

    let count = sim.nodes.len() as f32;
    let (sum_x, sum_y) = sim
        .nodes
        .iter()
        .fold((0.0f32, 0.0f32), |(x, y), node| (x + node.position.x, y + node.position.y));
    let shift_x = sum_x / count - sim.center.x;
    let shift_y = sum_y / count - sim.center.y;

    for node in &mut sim.nodes {
        node.position.x -= shift_x;
        node.position.y -= shift_y;
    }
}
