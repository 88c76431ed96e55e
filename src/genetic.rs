//! Genetic algorithm evolving rhythm variants towards the durations of a source rhythm.
//!
//! Chromosomes are lists of rhythm genes (divisor, multiplier, note or rest). Fitness is a
//! penalty: it grows with the deviation of total, note and rest durations from the source
//! rhythm and with the number of genes out of place, so the best chromosome has the lowest
//! fitness value.

use rand::{seq::IndexedRandom, seq::SliceRandom, Rng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{
    error::{Error, Result},
    random::new_rand_gen,
};

// -------------------------------------------------------------------------------------------------

const MATCH_TOLERANCE: f64 = 0.00001;

/// A single rhythm gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gene {
    pub divisor: u32,
    pub multiplier: u32,
    pub note: bool,
}

impl Gene {
    pub fn new(divisor: u32, multiplier: u32, note: bool) -> Self {
        Self {
            divisor: divisor.max(1),
            multiplier: multiplier.max(1),
            note,
        }
    }

    /// Duration in seconds for the given seconds per beat.
    pub fn duration(&self, beat_time: f64) -> f64 {
        beat_time / self.divisor as f64 * self.multiplier as f64
    }
}

/// Pick two ordered, distinct loci when possible.
fn two_loci<R: Rng>(rand_gen: &mut R, length: usize) -> (usize, usize) {
    match length {
        0 | 1 => (0, 0),
        2 => (0, 1),
        _ => {
            let p = rand_gen.random_range(0..length);
            let mut q = rand_gen.random_range(0..length);
            while q == p {
                q = rand_gen.random_range(0..length);
            }
            (p.min(q), p.max(q))
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// The source rhythm and its cached durations.
#[derive(Debug, Clone)]
struct Target {
    genes: Vec<Gene>,
    values: Vec<Gene>,
    beat_time: f64,
    duration: f64,
    note_duration: f64,
    rest_duration: f64,
}

impl Target {
    fn new(genes: Vec<Gene>, beat_time: f64) -> Self {
        let mut values = Vec::new();
        for gene in &genes {
            if !values.contains(gene) {
                values.push(*gene);
            }
        }
        let (duration, note_duration, rest_duration) = durations(&genes, beat_time);
        Self {
            genes,
            values,
            beat_time,
            duration,
            note_duration,
            rest_duration,
        }
    }
}

fn durations(genes: &[Gene], beat_time: f64) -> (f64, f64, f64) {
    let mut notes = 0.0;
    let mut rests = 0.0;
    for gene in genes {
        if gene.note {
            notes += gene.duration(beat_time);
        } else {
            rests += gene.duration(beat_time);
        }
    }
    (notes + rests, notes, rests)
}

fn deviation(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs();
    if diff < MATCH_TOLERANCE {
        0.0
    } else {
        diff
    }
}

// -------------------------------------------------------------------------------------------------

/// A candidate rhythm with its fitness penalty.
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome {
    genes: Vec<Gene>,
    fitness: f64,
    duration: f64,
}

impl Chromosome {
    fn random<R: Rng>(rand_gen: &mut R, target: &Target) -> Self {
        let genes = (0..target.genes.len())
            .map(|_| *target.values.choose(rand_gen).unwrap_or(&target.genes[0]))
            .collect();
        let mut chromosome = Self {
            genes,
            fitness: 0.0,
            duration: 0.0,
        };
        chromosome.update_fitness(target);
        chromosome
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    fn update_fitness(&mut self, target: &Target) {
        let beat_time = target.beat_time;
        let (duration, notes, rests) = durations(&self.genes, beat_time);
        self.duration = duration;
        let length = self.genes.len().max(1) as f64;

        let mut gene_matches = 0;
        let mut value_matches = 0;
        for (gene, fit) in self.genes.iter().zip(&target.genes) {
            let dur_diff = (gene.duration(beat_time) - fit.duration(beat_time)).abs();
            if dur_diff < MATCH_TOLERANCE {
                value_matches += 1;
                if gene.note == fit.note {
                    gene_matches += 1;
                }
            }
        }
        let gene_score = (length - gene_matches as f64) * (duration / length);
        let value_score = (length - value_matches as f64) * (duration / length);

        self.fitness = deviation(duration, target.duration) * 2.33
            + deviation(rests, target.rest_duration) * 1.5
            + deviation(notes, target.note_duration) * 1.5
            + gene_score
            + value_score * 0.666;
    }

    fn mutate<R: Rng>(&mut self, rand_gen: &mut R, rate: f64) {
        if self.genes.is_empty() || rand_gen.random::<f64>() >= rate {
            return;
        }
        let length = self.genes.len();
        match rand_gen.random_range(0..5) {
            // inversion of an inner segment
            0 => {
                let (p, q) = two_loci(rand_gen, length);
                self.genes[p..=q].reverse();
            }
            // equivalent ratio
            1 => {
                let gene = &mut self.genes[rand_gen.random_range(0..length)];
                let halve = rand_gen.random_bool(0.5);
                let factor = if gene.divisor % 2 == 0 && gene.multiplier % 2 == 0 {
                    2
                } else if gene.divisor % 3 == 0 && gene.multiplier % 3 == 0 {
                    3
                } else if halve {
                    2
                } else {
                    3
                };
                let reducible = gene.divisor % factor == 0 && gene.multiplier % factor == 0;
                if halve && reducible {
                    gene.divisor /= factor;
                    gene.multiplier /= factor;
                } else {
                    gene.divisor *= factor;
                    gene.multiplier *= factor;
                }
            }
            // divisor step
            2 => {
                let gene = &mut self.genes[rand_gen.random_range(0..length)];
                if gene.divisor == 1 || rand_gen.random_bool(0.5) {
                    gene.divisor += 1;
                } else {
                    gene.divisor -= 1;
                }
            }
            // multiplier step
            3 => {
                let gene = &mut self.genes[rand_gen.random_range(0..length)];
                let add = |rand_gen: &mut R, divisor: u32| {
                    if divisor <= 1 {
                        1
                    } else {
                        rand_gen.random_range(1..divisor)
                    }
                };
                if gene.multiplier == 1 || rand_gen.random_bool(0.5) {
                    gene.multiplier += add(rand_gen, gene.divisor);
                } else {
                    gene.multiplier -= rand_gen.random_range(1..gene.multiplier);
                }
            }
            // note / rest flip
            _ => {
                let gene = &mut self.genes[rand_gen.random_range(0..length)];
                gene.note = !gene.note;
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// A population of chromosomes, evolved generation by generation.
#[derive(Debug, Clone)]
pub struct GeneticAlgorithm {
    target: Target,
    population: Vec<Chromosome>,
    crossover_rate: f64,
    mutation_rate: f64,
    rand_gen: Xoshiro256PlusPlus,
}

impl GeneticAlgorithm {
    /// Minimal fitness which is considered too good a start for a fresh chromosome.
    const INIT_FITNESS_THRESHOLD: f64 = 0.1;
    const FIT_SCALER: f64 = 10.0;

    pub fn new(
        source: Vec<Gene>,
        population_size: usize,
        beat_time: f64,
        crossover_rate: f64,
        mutation_rate: f64,
        seed: u64,
    ) -> Result<Self> {
        if source.is_empty() {
            return Err(Error::ParameterObjectSyntax(
                "genetic rhythms need at least one source pulse".to_string(),
            ));
        }
        if population_size < 2 {
            return Err(Error::ParameterObjectSyntax(
                "genetic population size must be at least 2".to_string(),
            ));
        }
        let target = Target::new(source, beat_time);
        let mut rand_gen = new_rand_gen(seed);
        let population = (0..population_size)
            .map(|_| {
                let mut chromosome = Chromosome::random(&mut rand_gen, &target);
                if chromosome.fitness <= Self::INIT_FITNESS_THRESHOLD {
                    chromosome.mutate(&mut rand_gen, 1.0);
                    chromosome.update_fitness(&target);
                }
                chromosome
            })
            .collect();
        let mut ga = Self {
            target,
            population,
            crossover_rate,
            mutation_rate,
            rand_gen,
        };
        ga.sort_population();
        Ok(ga)
    }

    pub fn population(&self) -> &[Chromosome] {
        &self.population
    }

    /// The fittest chromosome.
    pub fn best(&self) -> &Chromosome {
        &self.population[0]
    }

    pub fn average_fitness(&self) -> f64 {
        self.population.iter().map(|c| c.fitness).sum::<f64>() / self.population.len() as f64
    }

    fn sort_population(&mut self) {
        self.population
            .sort_by(|a, b| a.fitness.total_cmp(&b.fitness));
    }

    /// Roulette selection: lower fitness penalties get larger slices.
    fn select_parent(&mut self) -> usize {
        let max_fitness = self
            .population
            .iter()
            .map(|c| c.fitness)
            .fold(0.0, f64::max)
            * 1.5;
        let slice = |c: &Chromosome| ((max_fitness - c.fitness) * Self::FIT_SCALER).round() as i64;
        let sum = self.population.iter().map(slice).sum::<i64>().max(0);
        let stop = self.rand_gen.random_range(0..=sum);
        let mut order = (0..self.population.len()).collect::<Vec<_>>();
        order.shuffle(&mut self.rand_gen);
        let mut current = 0;
        for &index in &order {
            let next = current + slice(&self.population[index]);
            if stop >= current && stop <= next {
                return index;
            }
            current = next;
        }
        order[order.len() - 1]
    }

    fn parents(&mut self) -> (usize, usize) {
        let mom = self.select_parent();
        let mut dad = self.select_parent();
        let mut tries = 0;
        while dad == mom {
            tries += 1;
            if tries > 100 {
                dad = (mom + 1 + self.rand_gen.random_range(0..self.population.len() - 1))
                    % self.population.len();
                break;
            }
            dad = self.select_parent();
        }
        (dad, mom)
    }

    fn crossover(&mut self, dad: usize, mom: usize) -> (Vec<Gene>, Vec<Gene>) {
        let dad = &self.population[dad].genes;
        let mom = &self.population[mom].genes;
        if self.rand_gen.random::<f64>() < self.crossover_rate {
            let (p, q) = two_loci(&mut self.rand_gen, dad.len());
            let son = [&dad[..p], &mom[p..q], &dad[q..]].concat();
            let daughter = [&mom[..p], &dad[p..q], &mom[q..]].concat();
            (son, daughter)
        } else {
            (dad.clone(), mom.clone())
        }
    }

    /// Evolve one generation, passing the given proportion of the best chromosomes unchanged.
    pub fn step(&mut self, elite: f64) {
        let size = self.population.len();
        let elite_count = ((elite * size as f64).round() as usize).min(size);
        let mut next = self.population[..elite_count].to_vec();
        while next.len() < size {
            let (dad, mom) = self.parents();
            let (son, daughter) = self.crossover(dad, mom);
            for genes in [son, daughter] {
                if next.len() < size {
                    let mut child = Chromosome {
                        genes,
                        fitness: 0.0,
                        duration: 0.0,
                    };
                    child.mutate(&mut self.rand_gen, self.mutation_rate);
                    child.update_fitness(&self.target);
                    next.push(child);
                }
            }
        }
        self.population = next;
        self.sort_population();
    }
}

// -------------------------------------------------------------------------------------------------

/// Runs a genetic algorithm and collects the distinct best rhythms of all generations.
#[derive(Debug, Clone)]
pub struct Genome {
    ga: GeneticAlgorithm,
    elite: f64,
}

impl Genome {
    pub fn new(ga: GeneticAlgorithm, elite: f64) -> Self {
        Self { ga, elite }
    }

    /// Evolve `generations` generations and return the distinct best rhythms, fittest first.
    /// Rhythms with equal gene durations and note states count as the same.
    pub fn evolve(&mut self, generations: usize) -> Vec<Vec<Gene>> {
        let mut best: Vec<(f64, Vec<Gene>)> = Vec::new();
        for _ in 0..generations {
            self.ga.step(self.elite);
            let candidate = self.ga.best();
            if !best.iter().any(|(_, genes)| *genes == candidate.genes) {
                best.push((candidate.fitness, candidate.genes.clone()));
            }
        }
        best.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut unique: Vec<Vec<Gene>> = Vec::new();
        for (_, genes) in best {
            if !unique.iter().any(|other| equivalent(other, &genes)) {
                unique.push(genes);
            }
        }
        unique
    }
}

fn equivalent(a: &[Gene], b: &[Gene]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(a, b)| {
            (a.duration(1.0) - b.duration(1.0)).abs() < MATCH_TOLERANCE && a.note == b.note
        })
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn source() -> Vec<Gene> {
        vec![
            Gene::new(8, 3, true),
            Gene::new(8, 3, true),
            Gene::new(8, 1, false),
            Gene::new(4, 1, true),
        ]
    }

    #[test]
    fn fitness() -> Result<()> {
        let target = Target::new(source(), 1.0);
        assert_eq!(target.values.len(), 3);
        let mut exact = Chromosome {
            genes: source(),
            fitness: 0.0,
            duration: 0.0,
        };
        exact.update_fitness(&target);
        assert_eq!(exact.fitness(), 0.0);
        assert!((exact.duration() - 1.125).abs() < 1e-9);
        let mut other = Chromosome {
            genes: vec![Gene::new(4, 1, false); 4],
            fitness: 0.0,
            duration: 0.0,
        };
        other.update_fitness(&target);
        assert!(other.fitness() > 0.0);
        Ok(())
    }

    #[test]
    fn evolution() -> Result<()> {
        let ga = GeneticAlgorithm::new(source(), 20, 0.5, 0.7, 0.06, 42)?;
        let mut genome = Genome::new(ga, 0.01);
        let rhythms = genome.evolve(30);
        assert!(!rhythms.is_empty());
        assert!(rhythms
            .iter()
            .all(|r| r.len() == 4 && r.iter().all(|g| g.divisor > 0 && g.multiplier > 0)));

        let mut again = Genome::new(GeneticAlgorithm::new(source(), 20, 0.5, 0.7, 0.06, 42)?, 0.01);
        assert_eq!(again.evolve(30), rhythms);

        assert!(GeneticAlgorithm::new(vec![], 20, 0.5, 0.7, 0.06, 0).is_err());
        Ok(())
    }
}
