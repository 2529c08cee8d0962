//! Topological discharge accumulation and Strahler ordering.

use std::collections::VecDeque;

use super::potential::MM_DAY_KM2_TO_M3_S;
use super::RiverConfig;
use crate::terrain::Cell;

/// Rebuilds every river cell's `upstream` list from the `downstream` links.
pub fn link_upstream(cells: &mut [Cell]) {
    for cell in cells.iter_mut() {
        cell.river.upstream.clear();
    }
    for i in 0..cells.len() {
        if !cells[i].river.is_river {
            continue;
        }
        if let Some(d) = cells[i].river.downstream {
            if cells[d].river.is_river {
                cells[d].river.upstream.push(i);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Inflow {
    discharge: f32,
    max_order: u32,
    at_max: u32,
}

impl Inflow {
    fn receive(&mut self, discharge: f32, order: u32) {
        self.discharge += discharge;
        if order > self.max_order {
            self.max_order = order;
            self.at_max = 1;
        } else if order == self.max_order {
            self.at_max += 1;
        }
    }

    fn order(&self) -> u32 {
        match self.max_order {
            0 => 1,
            m if self.at_max >= 2 => m + 1,
            m => m,
        }
    }
}

/// Discharge (m³/s) that cell `i` passes downstream given its inflow.
///
/// Own contribution is the source flow plus local seasonal runoff. Wet soil
/// adds up to `soil_exchange` of the local runoff; dry soil absorbs up to
/// `soil_exchange` of the smaller of inflow and own contribution, so the
/// result never drops below either.
fn settle(cell: &Cell, source_flow: f32, inflow: f32, cell_area_km2: f32, config: &RiverConfig) -> f32 {
    let exchange = config.soil_exchange.clamp(0.0, 1.0);
    let local = cell.seasonal_runoff.max(0.0) * cell_area_km2 * MM_DAY_KM2_TO_M3_S;
    let own = source_flow.max(0.0) + local;
    let wet = (cell.soil_moisture / 100.0).clamp(0.0, 1.0);
    let gain = exchange * wet * local;
    let loss = exchange * (1.0 - wet) * inflow.min(own);
    inflow + own + gain - loss
}

/// Accumulates discharge along river cells in Kahn (upstream-first) order and
/// assigns Strahler orders.
///
/// `source_flow[i]` is the flow injected at source cells, in m³/s. Cells left
/// over because of a cycle are flushed once in id order with whatever inflow
/// reached them. Returns the number of flushed cells.
pub fn accumulate_discharge(
    cells: &mut [Cell],
    source_flow: &[f32],
    cell_area_km2: f32,
    config: &RiverConfig,
) -> usize {
    let n = cells.len();
    let mut pending: Vec<usize> = cells.iter().map(|c| c.river.upstream.len()).collect();
    let mut queue: VecDeque<usize> =
        (0..n).filter(|&i| cells[i].river.is_river && pending[i] == 0).collect();
    let mut acc = Accumulator {
        source_flow,
        cell_area_km2,
        config,
        inflow: vec![Inflow::default(); n],
        settled: vec![false; n],
    };

    while let Some(i) = queue.pop_front() {
        if let Some(d) = acc.release(cells, i) {
            pending[d] = pending[d].saturating_sub(1);
            if pending[d] == 0 {
                queue.push_back(d);
            }
        }
    }

    let leftovers: Vec<usize> = (0..n).filter(|&i| cells[i].river.is_river && !acc.settled[i]).collect();
    for &i in &leftovers {
        acc.release(cells, i);
    }
    leftovers.len()
}

struct Accumulator<'a> {
    source_flow: &'a [f32],
    cell_area_km2: f32,
    config: &'a RiverConfig,
    inflow: Vec<Inflow>,
    settled: Vec<bool>,
}

impl Accumulator<'_> {
    /// Settles cell `i` and hands its discharge to an unsettled downstream
    /// river cell, which is returned.
    fn release(&mut self, cells: &mut [Cell], i: usize) -> Option<usize> {
        let inflow = self.inflow[i];
        let source = self.source_flow.get(i).copied().unwrap_or(0.0);
        let discharge = settle(&cells[i], source, inflow.discharge, self.cell_area_km2, self.config);
        let order = inflow.order();
        cells[i].river.discharge = discharge;
        cells[i].river.order = order;
        self.settled[i] = true;
        match cells[i].river.downstream {
            Some(d) if cells[d].river.is_river && !self.settled[d] => {
                self.inflow[d].receive(discharge, order);
                Some(d)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::SurfaceType;

    /// Cells 0..count, each linked to the given downstream; the last is ocean.
    fn chain(links: &[Option<usize>]) -> Vec<Cell> {
        links
            .iter()
            .enumerate()
            .map(|(i, &down)| {
                let mut c = Cell::new(i, 0.0, i as f32);
                c.surface = if down.is_some() { SurfaceType::Plains } else { SurfaceType::Ocean };
                c.river.is_river = down.is_some();
                c.river.downstream = down;
                c.seasonal_runoff = 0.5;
                c.soil_moisture = 30.0;
                c
            })
            .collect()
    }

    #[test]
    fn test_discharge_grows_downstream() {
        // A(0) -> B(1) -> C(2) -> ocean(3)
        let mut cells = chain(&[Some(1), Some(2), Some(3), None]);
        link_upstream(&mut cells);
        let mut source = vec![0.0; 4];
        source[0] = 5.0;
        let flushed = accumulate_discharge(&mut cells, &source, 100.0, &RiverConfig::default());
        assert_eq!(flushed, 0);
        let q: Vec<f32> = cells.iter().map(|c| c.river.discharge).collect();
        assert!(q[0] >= 5.0);
        assert!(q[1] >= q[0]);
        assert!(q[2] >= q[1]);
        assert_eq!(q[3], 0.0);
        assert!(cells[..3].iter().all(|c| c.river.order == 1));
    }

    #[test]
    fn test_discharge_is_at_least_own_contribution() {
        let mut cells = chain(&[Some(1), Some(2), None]);
        cells[1].soil_moisture = 0.0;
        link_upstream(&mut cells);
        let source = vec![40.0, 1.0, 0.0];
        accumulate_discharge(&mut cells, &source, 100.0, &RiverConfig { soil_exchange: 1.0, ..Default::default() });
        let local = 0.5 * 100.0 * MM_DAY_KM2_TO_M3_S;
        assert!(cells[1].river.discharge >= 1.0 + local - 1e-4);
        assert!(cells[1].river.discharge >= cells[0].river.discharge - 1e-4);
    }

    #[test]
    fn test_confluence_raises_strahler_order() {
        // 0 -> 2, 1 -> 2, 2 -> 3, 3 -> ocean(4)
        let mut cells = chain(&[Some(2), Some(2), Some(3), Some(4), None]);
        link_upstream(&mut cells);
        assert_eq!(cells[2].river.upstream, vec![0, 1]);
        accumulate_discharge(&mut cells, &[1.0, 1.0, 0.0, 0.0, 0.0], 10.0, &RiverConfig::default());
        assert_eq!(cells[0].river.order, 1);
        assert_eq!(cells[2].river.order, 2);
        assert_eq!(cells[3].river.order, 2);
        assert!(cells[2].river.discharge > cells[0].river.discharge + cells[1].river.discharge - 1e-4);
    }

    #[test]
    fn test_cycle_is_flushed_once() {
        let mut cells = chain(&[Some(1), Some(0), None]);
        link_upstream(&mut cells);
        let flushed = accumulate_discharge(&mut cells, &[1.0, 0.0, 0.0], 10.0, &RiverConfig::default());
        assert_eq!(flushed, 2);
        assert!(cells[0].river.discharge > 0.0);
        assert!(cells[1].river.discharge > 0.0);
    }
}
