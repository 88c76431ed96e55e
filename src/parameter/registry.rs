//! Typed registry of all parameter objects, keyed by long name and short alias.
//!
//! Each entry declares its argument names and default arguments. Loading an argument tree
//! looks up the entry, merges the supplied arguments with the defaults, validates and
//! constructs the object.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::error::{Error, Result};

use super::{
    filter, generator, rhythm, statics, Arg, Args, CloneStatic, FilterObject, GeneratorObject,
    RhythmObject, TextureStatic,
};

// -------------------------------------------------------------------------------------------------

/// Parameter object categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Generator,
    Rhythm,
    Filter,
    TextureStatic,
    CloneStatic,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Generator => "generator",
            Self::Rhythm => "rhythm",
            Self::Filter => "filter",
            Self::TextureStatic => "texture static",
            Self::CloneStatic => "clone static",
        };
        f.write_str(name)
    }
}

/// Declaration of a parameter object.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub name: &'static str,
    pub alias: &'static str,
    /// Comma separated argument names.
    pub arguments: &'static str,
    /// Default arguments, as argument string.
    pub defaults: &'static str,
    pub doc: &'static str,
}

const fn entry(
    name: &'static str,
    alias: &'static str,
    arguments: &'static str,
    defaults: &'static str,
    doc: &'static str,
) -> Entry {
    Entry {
        name,
        alias,
        arguments,
        defaults,
        doc,
    }
}

const WAVE_ARGS: &str = "step, period, phase, min, max";
const WAVE_DEFAULTS: &str = "e, 30, 0, 0, 1";
const WAVE_POWER_ARGS: &str = "step, period, phase, exponent, min, max";
const WAVE_POWER_DEFAULTS: &str = "e, 30, 0, 2, 0, 1";
const HALF_PERIOD_DEFAULTS: &str = "e, (bg, rc, (10, 20, 30)), 0, 0, 1";
const BREAK_POINT_ARGS: &str = "step, edge, points";
const BREAK_POINT_DEFAULTS: &str = "e, l, ((0, 1), (6, .3), (12, .3), (18, 0), (24, .6))";
const BREAK_GRAPH_ARGS: &str = "step, edge, xStep, y, count";
const BREAK_GRAPH_DEFAULTS: &str = "e, l, (bg, rc, (4, 6, 8)), (ru, 0, 1), 6";
const OPERATOR_ARGS: &str = "a, b";
const OPERATOR_DEFAULTS: &str = "(ws, e, 30, 0, 0, 1), (a, .5, (c, .025))";
const MASK_ARGS: &str = "boundary, min, max, source";
const MASK_DEFAULTS: &str = "l, (ws, e, 60, 0, .5, 0), (wc, e, 90, 0, .5, 1), (ru, 0, 1)";

/// All generators.
pub const GENERATORS: &[Entry] = &[
    entry("constant", "c", "value", "0", "Always returns the same value."),
    entry("staticInst", "si", "instrument, orchestra", "3, csoundNative",
        "An instrument number of an orchestra."),
    entry("staticRange", "sr", "range", "(0, 20)", "A time range in seconds."),
    entry("cyclicGen", "cg", "direction, min, max, increment", "ud, 0, 1, .125",
        "Cycles between min and max by a fixed increment."),
    entry("basketGen", "bg", "selector, values", "rc, (0, .25, .25, 1)",
        "Chooses values from a list with a selector."),
    entry("basketFill", "bf", "selector, source, count", "oc, (ru, 0, 1), 10",
        "Fills a list from a generator, then chooses from it with a selector."),
    entry("basketFillSelect", "bfs", "source, count, unit",
        "(ru, 0, 1), 10, (rb, .2, .2, 0, 1)",
        "Fills a list from a generator, then chooses from it with a unit interval value."),
    entry("basketSelect", "bs", "values, unit", "(1.5, 2, 3), (rb, .2, .2, 0, 1)",
        "Chooses values from a list with a unit interval value."),
    entry("directorySelect", "ds", "directory, extension, selector", "., aif, rw",
        "Chooses file paths with an extension from audio directories."),
    entry("constantFile", "cf", "path", ".", "Always returns the same file path."),
    entry("typeFormat", "tf", "format, source", "sq, (bg, oc, (0, 1))",
        "Formats generated values as strings."),
    entry("oneOver", "oo", "source", "(ws, e, 30, 0, .5, 2)", "The reciprocal of a value."),
    entry("pathRead", "pr", "format", "forte", "Reads the current multiset of the path."),
    entry("fibonacciSeries", "fs", "start, length, min, max, selector", "200, 20, 0, 1, oc",
        "Chooses from a normalized segment of the fibonacci series."),
    entry("valueSieve", "vs", "sieve, length, min, max, selector",
        "3&19|4&13@11, 360, 0, 1, oo",
        "Chooses from a sieve segment, normalized within its integer range."),
    entry("sieveFunnel", "sf", "sieve, length, min, max, source",
        "3|4, 24, 0, 1, (ru, 0, 1)",
        "Moves generated values to the nearest point of a scaled sieve segment."),
    entry("sieveList", "sl", "sieve, lower, upper, format, selector", "3|4, -12, 12, int, oc",
        "Chooses from a sieve segment in a sieve format."),
    entry("listPrime", "lp", "start, length, format, selector", "2, 50, int, oc",
        "Chooses from a segment of prime numbers in a sieve format."),
    entry("valuePrime", "vp", "start, length, min, max, selector", "2, 50, 0, 1, oo",
        "Chooses from a normalized segment of prime numbers."),
    entry("logisticMap", "lm", "init, lambda, min, max", ".5, (wt, e, 90, 0, 2.75, 4), 0, 1",
        "Values of the logistic map with a dynamic growth rate."),
    entry("henonBasket", "hb", "x, y, a, b, count, readout, min, max, selector",
        ".5, .5, 1.4, .3, 1000, x, 0, 1, oc",
        "Chooses from normalized values of a Henon attractor."),
    entry("lorenzBasket", "lb", "x, y, z, r, s, b, count, readout, min, max, selector",
        "1, 1, 1, 28, 10, 2.67, 1000, xyz, 0, 1, oc",
        "Chooses from normalized values of a Lorenz attractor."),
    entry("noise", "n", "resolution, color, min, max", "100, pink, 0, 1",
        "Fractional 1/f noise with a dynamic spectrum."),
    entry("mask", "m", MASK_ARGS, MASK_DEFAULTS,
        "Fits values into dynamic boundaries by limiting, wrapping or reflecting."),
    entry("maskReject", "mr", MASK_ARGS, MASK_DEFAULTS,
        "Moves values out of dynamic boundaries by limiting, wrapping or reflecting."),
    entry("maskScale", "ms", "source, count, min, max, selector",
        "(lp, 100, 120, wid, oc), 120, (bphc, e, l, ((0, 0), (120, -3))), 3, oc",
        "Normalizes collected values and scales them within dynamic boundaries."),
    entry("funnelBinary", "fb", "match, threshold, a, b, source",
        "u, (bpl, e, s, ((0, 0), (120, 1))), (a, 0, (c, .1)), (a, 1, (c, -.1)), (ru, 0, 1)",
        "Moves values to one of two boundaries, depending on a threshold."),
    entry("accumulator", "a", "init, source", "0, (bg, rc, (1, 3, 4, 7, -11))",
        "Running sum of generated values."),
    entry("quantize", "q", "grid, width, repeat, pull, source",
        "(c, 0), (c, .25), 1, (c, 1), (ru, 0, 1)",
        "Attracts values to a dynamic grid."),
    entry("markovValue", "mv", "transitions, order",
        "a{.2}b{.5}c{.8}d{0}:{a=5|b=4|c=7|d=1}, (c, 0)",
        "Values of a Markov chain with a dynamic order."),
    entry("markovGeneratorAnalysis", "mga", "source, count, maxOrder, order",
        "(ws, e, 30, 0, 0, 1), 30, 2, (mv, a{1}b{0}c{2}:{a=10|b=1|c=2}, (c, 0))",
        "Values of a Markov chain created from generated values."),
    entry("grammarTerminus", "gt", "grammar, steps, selector",
        "a{.2}b{.5}c{.8}d{0}@a{ba}b{bc}c{cd}d{ac}@a, 6, oc",
        "Chooses from the values of a rewritten L-system state."),
    entry("feedbackModelLibrary", "fml", "model, ageStep, threshold, min, max",
        "cc, (bg, rc, (1, 3)), (c, .9), 0, 1",
        "Values of a particle feedback system."),
    entry("caValue", "cv", "spec, rule, mutation, table, min, max, selector",
        "f{s}, (c, 110), (c, 0), sr, 0, 1, oc",
        "Chooses from normalized values of a cellular automaton."),
    entry("caList", "cl", "spec, rule, mutation, table, selector",
        "f{f}i{c}x{81}y{120}, .25, .0005, sc, oc",
        "Chooses from values of a cellular automaton."),
    entry("iterateGroup", "ig", "source, group", "(ws, e, 30, 0, 0, 1), (bg, rc, (-3, 1, -1, 5))",
        "Repeats or skips generated values."),
    entry("iterateWindow", "iw", "sources, group, selector",
        "((ru, 0, 1), (a, .5, (c, .1))), (bg, rc, (-3, 6, -1, 15)), oc",
        "Repeats or skips values of generators chosen with a selector."),
    entry("iterateHold", "ih", "source, fill, refresh, selector",
        "(ru, 0, 1), (bg, rc, (2, 3, 4)), (bg, oc, (12, 24)), oc",
        "Chooses from a periodically refilled list of generated values."),
    entry("iterateCross", "ic", "a, b, interpolation",
        "(ws, e, 30, 0, 0, 1), (wp, e, 30, .25, 0, 1), (bpl, e, l, ((0, 0), (40, 1), (80, 0)))",
        "Interpolates between the values of two generators."),
    entry("iterateSelect", "is", "source, fill, refresh, unit",
        "(ru, 0, 1), (bg, rc, (10, 20)), (bg, oc, (12, 24)), (ru, 0, 1)",
        "Chooses with a unit interval value from a periodically refilled list."),
    entry("sampleAndHold", "sah", "comparison, source, trigger, threshold",
        "gt, (ru, 0, 1), (wsd, e, 10, 0, 0, 1), (c, .5)",
        "Samples a generator when a trigger passes a threshold, else holds."),
    entry("waveSine", "ws", WAVE_ARGS, WAVE_DEFAULTS, "A sine wave."),
    entry("waveCosine", "wc", WAVE_ARGS, WAVE_DEFAULTS, "A cosine wave."),
    entry("waveSawUp", "wsu", WAVE_ARGS, WAVE_DEFAULTS, "A rising saw wave."),
    entry("waveSawDown", "wsd", WAVE_ARGS, WAVE_DEFAULTS, "A falling saw wave."),
    entry("wavePulse", "wp", WAVE_ARGS, WAVE_DEFAULTS, "A pulse wave."),
    entry("waveTriangle", "wt", WAVE_ARGS, WAVE_DEFAULTS, "A triangle wave."),
    entry("wavePowerUp", "wpu", WAVE_POWER_ARGS, WAVE_POWER_DEFAULTS, "A rising power curve."),
    entry("wavePowerDown", "wpd", WAVE_POWER_ARGS, WAVE_POWER_DEFAULTS,
        "A falling power curve."),
    entry("waveHalfPeriodSine", "whps", WAVE_ARGS, HALF_PERIOD_DEFAULTS,
        "A sine wave with a new period every half period."),
    entry("waveHalfPeriodCosine", "whpc", WAVE_ARGS, HALF_PERIOD_DEFAULTS,
        "A cosine wave with a new period every half period."),
    entry("waveHalfPeriodPulse", "whpp", WAVE_ARGS, HALF_PERIOD_DEFAULTS,
        "A pulse wave with a new period every half period."),
    entry("waveHalfPeriodTriangle", "whpt", WAVE_ARGS, HALF_PERIOD_DEFAULTS,
        "A triangle wave with a new period every half period."),
    entry("randomUniform", "ru", "min, max", "0, 1", "Uniform random values."),
    entry("randomLinear", "rl", "min, max", "0, 1", "Linearly decreasing random values."),
    entry("randomInverseLinear", "ril", "min, max", "0, 1",
        "Linearly increasing random values."),
    entry("randomTriangular", "rt", "min, max", "0, 1", "Triangular random values."),
    entry("randomInverseTriangular", "rit", "min, max", "0, 1",
        "Inverse triangular random values."),
    entry("randomExponential", "re", "lambda, min, max", ".5, 0, 1",
        "Exponential random values."),
    entry("randomInverseExponential", "rie", "lambda, min, max", ".5, 0, 1",
        "Inverse exponential random values."),
    entry("randomBilateralExponential", "rbe", "lambda, min, max", ".5, 0, 1",
        "Bilateral exponential random values."),
    entry("randomGauss", "rg", "mu, sigma, min, max", ".5, .1, 0, 1",
        "Gaussian random values."),
    entry("randomCauchy", "rc", "alpha, mu, min, max", ".1, .5, 0, 1",
        "Cauchy random values."),
    entry("randomBeta", "rb", "alpha, beta, min, max", ".5, .5, 0, 1", "Beta random values."),
    entry("randomWeibull", "rw", "alpha, beta, min, max", ".5, 2, 0, 1",
        "Weibull random values."),
    entry("breakPointLinear", "bpl", BREAK_POINT_ARGS, BREAK_POINT_DEFAULTS,
        "Linear break point function."),
    entry("breakPointPower", "bpp", "step, edge, points, exponent",
        "e, l, ((0, 1), (6, .3), (12, .3), (18, 0), (24, .6)), -1.5",
        "Power curve break point function."),
    entry("breakPointHalfCosine", "bphc", BREAK_POINT_ARGS, BREAK_POINT_DEFAULTS,
        "Half cosine break point function."),
    entry("breakPointFlat", "bpf", BREAK_POINT_ARGS, BREAK_POINT_DEFAULTS,
        "Stepped break point function."),
    entry("breakGraphLinear", "bgl", BREAK_GRAPH_ARGS, BREAK_GRAPH_DEFAULTS,
        "Linear break point function through generated points."),
    entry("breakGraphPower", "bgp", "step, edge, xStep, y, count, exponent",
        "e, l, (bg, rc, (4, 6, 8)), (ru, 0, 1), 6, -1.5",
        "Power curve break point function through generated points."),
    entry("breakGraphHalfCosine", "bghc", BREAK_GRAPH_ARGS, BREAK_GRAPH_DEFAULTS,
        "Half cosine break point function through generated points."),
    entry("breakGraphFlat", "bgf", BREAK_GRAPH_ARGS, BREAK_GRAPH_DEFAULTS,
        "Stepped break point function through generated points."),
    entry("lineSegment", "ls", "step, period, min, max", "e, 10, 0, 5",
        "Line segments between generated start and end values."),
    entry("envelopeGeneratorTrapezoid", "egt",
        "units, period, rampUp, widthMax, rampDown, widthMin, min, max",
        "p, (c, 10), .3, .2, .3, .2, 0, 1",
        "Successive trapezoid envelopes with generated durations."),
    entry("envelopeGeneratorUnit", "egu", "period, center, width, min, max",
        "(c, 10), .5, .5, 0, 1",
        "Successive linen envelopes with generated durations."),
    entry("envelopeGeneratorAdsr", "ega",
        "units, period, attack, decay, sustain, release, level, min, max",
        "p, (c, 10), 2, 1, 4, 3, .5, 0, 1",
        "Successive ADSR envelopes with generated durations."),
    entry("operatorAdd", "oa", OPERATOR_ARGS, OPERATOR_DEFAULTS, "Sum of two generators."),
    entry("operatorSubtract", "os", OPERATOR_ARGS, OPERATOR_DEFAULTS,
        "Difference of two generators."),
    entry("operatorMultiply", "om", OPERATOR_ARGS, OPERATOR_DEFAULTS,
        "Product of two generators."),
    entry("operatorDivide", "od", OPERATOR_ARGS, OPERATOR_DEFAULTS,
        "Quotient of two generators."),
    entry("operatorPower", "op", OPERATOR_ARGS, OPERATOR_DEFAULTS,
        "A generator raised to the power of another."),
    entry("operatorCongruence", "oc", OPERATOR_ARGS, OPERATOR_DEFAULTS,
        "A generator modulo another."),
];

/// All rhythms.
pub const RHYTHMS: &[Entry] = &[
    entry("pulseTriple", "pt", "divisor, multiplier, accent, sustain",
        "(bg, rc, (6, 5, 4, 3)), (bg, rc, (1, 2, 3)), (bg, rc, (1, 1, 1, 0)), (ru, .5, 1.5)",
        "Pulses from generated divisors, multipliers, accents and sustain scalars."),
    entry("loop", "l", "pulses, selector",
        "((3, 1, 1), (3, 1, 1), (8, 1, 1), (8, 1, 1), (8, 3, 1), (3, 2, 0)), oc",
        "Chooses from a list of pulses with a selector."),
    entry("binaryAccent", "ba", "pulses", "((3, 1, 1), (3, 2, 1))",
        "Uses the second pulse on the first pitch of each set, else the first."),
    entry("convertSecond", "cs", "duration", "(ru, .25, 2.5)",
        "Durations in seconds from a generator."),
    entry("convertSecondTriple", "cst", "duration, sustain, accent",
        "(ru, .25, 2.5), (ru, .25, 2.5), (bg, rc, (0, 1, 1, 1))",
        "Durations, sustains and accents in seconds from generators."),
    entry("gaRhythm", "gr", "pulses, crossover, mutation, elitism, selector, population",
        "((3, 1, 1), (3, 1, 1), (6, 1, 1), (6, 3, 1), (3, 1, 0)), .7, .06, .01, oc, 20",
        "Chooses from rhythms evolved from a source rhythm by a genetic algorithm."),
    entry("pulseSieve", "ps", "sieve, length, pulse, selector, articulation",
        "3|4|5@2, 60, (3, 1, 1), oc, a",
        "Sounding pulses at sieve points, rests elsewhere."),
    entry("rhythmSieve", "rs", "sieve, length, selector, rhythm",
        "3|4|5, 60, rw, (l, ((3, 1, 1), (3, 1, 1), (3, 5, 1)))",
        "Rhythm values, muted where a sieve has no points."),
    entry("markovPulse", "mp", "transitions, order",
        "a{3,1,1}b{2,1,1}c{3,2,0}:{a=3|b=4|c=1}, (c, 0)",
        "Pulses of a Markov chain with a dynamic order."),
    entry("markovRhythmAnalysis", "mra", "source, count, maxOrder, order",
        "(l, ((3, 1, 1), (3, 1, 1), (8, 1, 1), (8, 1, 1), (8, 3, 1), (3, 2, 0)), oc), 12, 2, (c, 1)",
        "Pulses of a Markov chain created from the pulses of a rhythm."),
    entry("iterateRhythmGroup", "irg", "source, group",
        "(l, ((3, 1, 1), (3, 1, 1), (8, 1, 1), (8, 3, 1)), oc), (bg, rc, (-3, 1, -1, 5))",
        "Repeats or skips rhythm values."),
    entry("iterateRhythmWindow", "irw", "sources, group, selector",
        "((l, ((4, 3, 1), (4, 3, 1), (4, 2, 0), (8, 1, 1), (4, 2, 1), (4, 2, 1)), oc), \
         (cs, (ru, .0625, .25))), (bg, rc, (-2, 6, -1, 15)), oc",
        "Repeats or skips values of rhythms chosen with a selector."),
    entry("iterateRhythmHold", "irh", "source, fill, refresh, selector",
        "(l, ((3, 1, 1), (3, 1, 1), (6, 1, 1), (6, 5, 1)), oc), (bg, rc, (2, 3)), (bg, oc, (12, 24)), oc",
        "Chooses from a periodically refilled list of rhythm values."),
];

const FILTER_SOURCE_DEFAULTS: &str = "(ws, e, 30, 0, 0, 1)";

/// All filters.
pub const FILTERS: &[Entry] = &[
    entry("bypass", "b", "", "", "Returns values unchanged."),
    entry("replace", "r", "source", "(ru, 0, 1)", "Replaces values with generated values."),
    entry("orderBackward", "ob", "", "", "Reverses the order of values."),
    entry("orderRotate", "or", "offset", "40", "Rotates the order of values."),
    entry("pipeLine", "pl", "filters", "((or, 40), (ob))", "Applies filters in order."),
    entry("filterAdd", "fa", "source", FILTER_SOURCE_DEFAULTS, "Adds generated values."),
    entry("filterMultiply", "fm", "source", FILTER_SOURCE_DEFAULTS,
        "Multiplies by generated values."),
    entry("filterDivide", "fd", "source", FILTER_SOURCE_DEFAULTS,
        "Divides by generated values."),
    entry("filterPower", "fp", "source", FILTER_SOURCE_DEFAULTS,
        "Raises to the power of generated values."),
    entry("filterMultiplyAnchor", "fma", "anchor, source", "l, (wc, e, 30, 0, 0, 1)",
        "Multiplies the distance of values to an anchor by generated values."),
    entry("filterDivideAnchor", "fda", "anchor, source", "l, (wc, e, 30, 0, 1, 2)",
        "Divides the distance of values to an anchor by generated values."),
    entry("filterQuantize", "fq", "grid, width, repeat, pull", "(c, 0), (c, .25), 1, (c, 1)",
        "Attracts values to a dynamic grid."),
    entry("filterFunnelBinary", "ffb", "match, threshold, a, b", "u, (c, .5), (c, 0), (c, 1)",
        "Moves values to one of two boundaries, depending on a threshold."),
    entry("maskFilter", "mf", "boundary, min, max", "l, (c, 0), (c, 1)",
        "Fits values into dynamic boundaries."),
    entry("maskScaleFilter", "msf", "min, max", "(c, 0), (c, 1)",
        "Normalizes values and scales them within dynamic boundaries."),
];

/// All texture statics.
pub const TEXTURE_STATICS: &[Entry] = &[
    entry("parallelMotionList", "pml", "transpositions, delay", "(), 0",
        "Transpositions of parallel voices and their maximum time delay."),
    entry("maxTimeOffset", "mto", "offset", ".03", "Maximum random time offset in seconds."),
    entry("loopWithinSet", "lws", "switch", "on", "Reuse the pitches of a set until it ends."),
    entry("ornamentLibrarySelect", "ols", "group", "chromaticGroupC",
        "Ornament group used by ornamented textures."),
    entry("ornamentMaxDensity", "omd", "density", "1",
        "Maximum probability of ornamenting a note."),
    entry("levelFieldMonophonic", "lfm", "level", "event",
        "Field transposition is updated per set or per event."),
    entry("levelOctaveMonophonic", "lom", "level", "event",
        "Octave transposition is updated per set or per event."),
    entry("levelFieldPolyphonic", "lfp", "level", "event",
        "Field transposition of chords is updated per set, event or voice."),
    entry("levelOctavePolyphonic", "lop", "level", "event",
        "Octave transposition of chords is updated per set, event or voice."),
    entry("levelEventPartition", "lep", "level", "path",
        "Events are partitioned by the path's set durations or equally by sets."),
    entry("levelFrameDuration", "lfd", "level", "event",
        "Frame durations are updated per event or per frame."),
    entry("levelEventCount", "lec", "level", "set",
        "Event counts are updated per set or per texture."),
    entry("interpolationMethodControl", "imc", "method", "linear",
        "Interpolation method between events."),
    entry("parameterInterpolationControl", "pic", "switch", "on",
        "Interpolate amplitude, pan, pitch and aux values."),
    entry("snapSustainTime", "sst", "switch", "on", "Snap sustains to the frame grid."),
    entry("snapEventTime", "set", "switch", "on", "Snap event times to the frame grid."),
    entry("totalEventCount", "tec", "count", "20", "Total number of events."),
    entry("totalSegmentCount", "tsc", "count", "8", "Total number of time segments."),
    entry("eventDensityPartition", "edp", "level", "set",
        "Events are distributed equally per set or in proportion to set durations."),
    entry("pitchSelectorControl", "psc", "selector", "rc", "Selector for pitches of a set."),
    entry("multisetSelectorControl", "msc", "selector", "rc",
        "Selector for multisets of a path."),
    entry("pathDurationFraction", "pdf", "switch", "on",
        "Use the path's duration fractions for set time ranges."),
];

/// All clone statics.
pub const CLONE_STATICS: &[Entry] = &[
    entry("timeReferenceSource", "trs", "reference", "textureTime",
        "Filters read event times of the texture or of the clone."),
    entry("retrogradeMethodToggle", "rmt", "method", "off",
        "Reverse events or durations before filtering."),
];

// -------------------------------------------------------------------------------------------------

lazy_static! {
    static ref INDEX: HashMap<(Category, String), &'static Entry> = {
        let mut index = HashMap::new();
        for (category, entries) in [
            (Category::Generator, GENERATORS),
            (Category::Rhythm, RHYTHMS),
            (Category::Filter, FILTERS),
            (Category::TextureStatic, TEXTURE_STATICS),
            (Category::CloneStatic, CLONE_STATICS),
        ] {
            for entry in entries {
                index.insert((category, entry.name.to_ascii_lowercase()), entry);
                index.insert((category, entry.alias.to_ascii_lowercase()), entry);
            }
        }
        index
    };
    static ref DEFAULTS: HashMap<&'static str, Vec<Arg>> = {
        let mut defaults = HashMap::new();
        for entries in [GENERATORS, RHYTHMS, FILTERS, TEXTURE_STATICS, CLONE_STATICS] {
            for entry in entries {
                let args = parse_items(entry.defaults).unwrap_or_else(|err| {
                    log::error!("invalid defaults of '{}': {err}", entry.name);
                    Vec::new()
                });
                defaults.insert(entry.name, args);
            }
        }
        defaults
    };
}

// parse a comma separated argument string into a list of items
fn parse_items(input: &str) -> Result<Vec<Arg>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    match Arg::parse(&format!("({input})"))? {
        Arg::List(items) => Ok(items),
        other => Ok(vec![other]),
    }
}

/// Look up the entry of a parameter object by long name or alias, ignoring case.
pub fn find(category: Category, name: &str) -> Option<&'static Entry> {
    INDEX
        .get(&(category, name.trim().to_ascii_lowercase()))
        .copied()
}

/// All entries of a category.
pub fn entries(category: Category) -> &'static [Entry] {
    match category {
        Category::Generator => GENERATORS,
        Category::Rhythm => RHYTHMS,
        Category::Filter => FILTERS,
        Category::TextureStatic => TEXTURE_STATICS,
        Category::CloneStatic => CLONE_STATICS,
    }
}

pub fn is_generator(name: &str) -> bool {
    find(Category::Generator, name).is_some()
}

pub fn is_rhythm(name: &str) -> bool {
    find(Category::Rhythm, name).is_some()
}

/// Default arguments of an entry.
pub fn defaults(entry: &Entry) -> &'static [Arg] {
    DEFAULTS.get(entry.name).map(Vec::as_slice).unwrap_or(&[])
}

/// Resolve entry and complete arguments of an argument tree.
pub fn resolve(category: Category, arg: &Arg, seed: u64) -> Result<(&'static Entry, Args)> {
    let (name, supplied) = match arg {
        Arg::List(items) => match items.split_first() {
            Some((Arg::String(name), rest)) => (name.as_str(), rest),
            _ => {
                return Err(Error::ParameterObjectSyntax(format!(
                    "expected a {category} name as first item of '{arg}'"
                )))
            }
        },
        Arg::String(name) => (name.as_str(), &[][..]),
        Arg::Number(_) => {
            return Err(Error::ParameterObjectSyntax(format!(
                "expected a {category}, got '{arg}'"
            )))
        }
    };
    let entry = find(category, name).ok_or_else(|| {
        Error::ParameterObjectSyntax(format!("no {category} named '{name}'"))
    })?;
    let mut supplied = supplied.to_vec();
    // three argument pulse triples sustain for the full duration
    if entry.name == "pulseTriple" && supplied.len() == 3 {
        supplied.push(Arg::List(vec!["c".into(), 1.0.into()]));
    }
    let args = Args::new(entry.name, &supplied, defaults(entry), seed)?;
    Ok((entry, args))
}

// -------------------------------------------------------------------------------------------------

/// Load a generator. Plain numbers are wrapped into constants.
pub fn load_generator(arg: &Arg, seed: u64) -> Result<GeneratorObject> {
    if let Arg::Number(value) = arg {
        return Ok(GeneratorObject::constant(*value));
    }
    let (entry, args) = resolve(Category::Generator, arg, seed)?;
    let generator = generator::build(entry.name, &args)?;
    Ok(GeneratorObject::from_parts(entry.name, args.to_arg(), generator))
}

/// Load a rhythm.
pub fn load_rhythm(arg: &Arg, seed: u64) -> Result<RhythmObject> {
    let (entry, args) = resolve(Category::Rhythm, arg, seed)?;
    let rhythm = rhythm::build(entry.name, &args)?;
    Ok(RhythmObject::from_parts(entry.name, args.to_arg(), rhythm))
}

/// Load a filter.
pub fn load_filter(arg: &Arg, seed: u64) -> Result<FilterObject> {
    let (entry, args) = resolve(Category::Filter, arg, seed)?;
    let filter = filter::build(entry.name, &args)?;
    Ok(FilterObject::from_parts(entry.name, args.to_arg(), filter))
}

/// Load a texture static option.
pub fn load_texture_static(arg: &Arg) -> Result<TextureStatic> {
    let (entry, args) = resolve(Category::TextureStatic, arg, 0)?;
    statics::build_texture_static(entry.name, &args)
}

/// Load a clone static option.
pub fn load_clone_static(arg: &Arg) -> Result<CloneStatic> {
    let (entry, args) = resolve(Category::CloneStatic, arg, 0)?;
    statics::build_clone_static(entry.name, &args)
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::parameter::RefDict;

    #[test]
    fn tables() {
        // all names and aliases are unique per category
        for category in [
            Category::Generator,
            Category::Rhythm,
            Category::Filter,
            Category::TextureStatic,
            Category::CloneStatic,
        ] {
            let entries = entries(category);
            let mut names = entries
                .iter()
                .flat_map(|e| [e.name.to_ascii_lowercase(), e.alias.to_ascii_lowercase()])
                .collect::<Vec<_>>();
            let count = names.len();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), count, "duplicate names in {category}");
            // all defaults parse and match the declared argument names
            for entry in entries {
                let defaults = parse_items(entry.defaults).expect("defaults parse");
                let arguments = entry
                    .arguments
                    .split(',')
                    .filter(|a| !a.trim().is_empty())
                    .count();
                assert_eq!(defaults.len(), arguments, "argument count of {}", entry.name);
            }
        }
    }

    #[test]
    fn load_defaults() -> Result<()> {
        let context = RefDict::default();
        for entry in GENERATORS {
            let mut generator = load_generator(&Arg::String(entry.alias.into()), 1)
                .map_err(|err| err.with_context(entry.name))?;
            assert_eq!(generator.name(), entry.name);
            for i in 0..4 {
                generator.value(i as f64, &context);
            }
            // the complete argument tree reloads
            load_generator(generator.arg(), 1)?;
        }
        for entry in RHYTHMS {
            let mut rhythm = load_rhythm(&Arg::String(entry.name.into()), 1)
                .map_err(|err| err.with_context(entry.name))?;
            for i in 0..4 {
                let value = rhythm.value(i as f64, &context);
                assert!(value.dur >= 0.0, "{}", entry.name);
            }
        }
        for entry in FILTERS {
            let mut filter = load_filter(&Arg::String(entry.name.into()), 1)
                .map_err(|err| err.with_context(entry.name))?;
            let values = filter.filter(&[0.1, 0.2, 0.3], &[0.0, 1.0, 2.0], &[
                context.clone(),
                context.clone(),
                context.clone(),
            ]);
            assert_eq!(values.len(), 3, "{}", entry.name);
        }
        for entry in TEXTURE_STATICS {
            load_texture_static(&Arg::String(entry.name.into()))?;
        }
        for entry in CLONE_STATICS {
            load_clone_static(&Arg::String(entry.alias.into()))?;
        }
        Ok(())
    }

    #[test]
    fn errors() {
        assert!(load_generator(&Arg::parse("nope, 1").unwrap(), 0).is_err());
        assert!(load_generator(&Arg::parse("ru, 0, 1, 2").unwrap(), 0).is_err());
        assert!(load_generator(&Arg::parse("ru, a, 1").unwrap(), 0).is_err());
        assert!(load_rhythm(&Arg::parse("ru, 0, 1").unwrap(), 0).is_err());
        assert!(load_filter(&Arg::parse("pl, ((or, 2), (nope))").unwrap(), 0).is_err());
    }

    #[test]
    fn auto_constant() -> Result<()> {
        let mut generator = load_generator(&Arg::parse("ru, 2, (c, 2)")?, 0)?;
        assert_eq!(generator.number(0.0, &RefDict::default()), 2.0);
        let mut rhythm = load_rhythm(&Arg::parse("pt, 4, 1, 1")?, 0)?;
        let value = rhythm.value(0.0, &RefDict::with_bpm(120.0));
        assert_eq!((value.dur, value.sus, value.acc), (0.125, 0.125, 1.0));
        Ok(())
    }
}
