use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Static exclusion tables
// ---------------------------------------------------------------------------

/// Runs known to be corrupt or mismatched: mislabeled PDFs, duplicate runs and
/// malformed readings. Sorted ascending so membership is a binary search.
///
/// Any edit here must bump [`EXCLUSIONS_VERSION`].
pub static HISTORICAL_EXCLUSIONS: &[i64] = &[
    91, 92, 93, 94, 101, 209, 210, 211, 266, 267, 268, 270,
    271, 272, 273, 274, 275, 276, 278, 279, 280, 354, 357, 425,
    490, 546, 585, 607, 634, 635, 696, 727, 728, 916, 917, 980,
    1044, 1186, 1236, 1237, 1238, 1239, 1240, 1241, 1242, 1243, 1244, 1245,
    1246, 1278, 1279, 1280, 1375, 1376, 1405, 1417, 1418, 1419, 1420, 1421,
    1422, 1423, 1427, 1428, 1429, 1444, 1445, 1448, 1449, 1450, 1460, 1461,
    1462, 1463, 1464, 1465, 1466, 1467, 1468, 1469, 1612, 1613, 1614, 1641,
    1642, 1643, 1661, 1665, 1666, 1694, 1695, 1697, 1721, 1722, 1723, 1724,
    1725, 1726, 1727, 1728, 1731, 1861, 1862, 1863, 1869, 1870, 1967, 1999,
    2000, 2029, 2030, 2031, 2049, 2050, 2076, 2077, 2078, 2079, 2080, 2081,
    2196, 2197, 2243, 2244, 2245, 2246, 2247, 2279, 2353, 2491, 2492, 2502,
    2503, 2550, 2551, 2552, 2554, 2698, 2699, 2700, 2753, 2872, 2971, 3198,
    3199, 3238, 3239, 3240, 3247, 3248, 3249, 3254, 3256, 3327, 3328, 3329,
    3403, 3404, 3405, 3406, 3407, 3408, 3409, 3465, 3466, 3669, 3682, 3880,
    3881, 3951, 3952, 3953, 4133, 4134, 4135, 4136, 4148, 4149, 4150, 4191,
    4192, 4214, 4215, 4216, 4239, 4240, 4291, 4342, 4343, 4358, 4359, 4360,
    4436, 4437, 4438, 4444, 4571, 4660, 4663, 4664, 4665, 4668, 4692, 4693,
    4705, 4706, 4710, 4711, 4742, 4743, 4747, 4760, 4761, 4762, 4763, 4791,
    4793, 4817, 4874, 4900, 4953, 4954, 4955, 4956, 4957, 4958, 4959, 4960,
    4961, 4962, 4963, 4964, 4965, 4966, 4967, 4969, 4970, 4971, 4972, 4973,
    4974, 4975, 4986, 5005, 5008, 5009, 5010, 5011, 5019, 5020, 5021, 5040,
    5052, 5053, 5054, 5056, 5057, 5058, 5059, 5067, 5068, 5069, 5080, 5088,
    5089, 5090, 5091, 5092, 5148, 5199, 5200, 5201, 5202, 5203, 5204, 5205,
    5206, 5229, 5230, 5231, 5232, 5233, 5234, 5235, 5236, 5237, 5238, 5239,
    5245, 5246, 5247, 5253, 5280, 5281, 5288, 5293, 5294, 5307, 5308, 5309,
    5332, 5333, 5337, 5338, 5342, 5348, 5350, 5383, 5413, 5420, 5421, 5422,
    5423, 5425, 5428, 5430, 5431, 5437, 5438, 5439, 5442, 5443, 5444, 5445,
    5446, 5447, 5448, 5449, 5450, 5453, 5460, 5461, 5462, 5463, 5465, 5469,
    5471, 5473, 5507, 5508, 5517, 5518, 5524, 5525, 5527, 5528, 5532, 5538,
    5546, 5552, 5558, 5559, 5560, 5561, 5562, 5570, 5571, 5572, 5576, 5582,
    5583, 5592, 5594, 5596, 5597, 5603, 5604, 5619, 5621, 5622, 5629, 5630,
    5634, 5644, 5656, 5660, 5665, 5670, 5671, 5673, 5682, 5702, 5703, 5704,
    5712, 5713, 5714, 5715, 5716, 5717, 5719, 5720, 5723, 5725, 5734, 5736,
    5737, 5743, 5744, 5745, 5800, 5801, 5803, 5804, 5805, 5806, 5807, 5808,
    5816, 5818, 5819, 5820, 5825, 5831, 5832, 5833, 5834, 5835, 5836, 5837,
    5838, 5839, 5844, 5845, 5846, 5848, 5849, 5851, 5852, 5853, 5854, 5860,
    5861, 5864, 5866, 5867, 5868, 5869, 5872, 5874, 5875, 5876, 5877, 5878,
    5879, 5881, 5883, 5884, 5885, 5889, 5890, 5891, 5892, 5906, 5907, 5908,
    5909, 5910, 5911, 5920, 5921, 5922, 5923, 5924, 5926, 5933,
];

/// Runs whose readings look valid but carry substantively wrong numbers.
/// A subset of [`HISTORICAL_EXCLUSIONS`].
pub static READING_EXCLUSIONS: &[i64] = &[91, 92, 93, 2491, 2492];

pub const EXCLUSIONS_VERSION: &str = "2021.1";

// ---------------------------------------------------------------------------
// ExclusionSet
// ---------------------------------------------------------------------------

/// An immutable set of run ids that must not survive cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusionSet {
    version: &'static str,
    runs: &'static [i64],
}

impl ExclusionSet {
    /// `runs` must be sorted ascending.
    pub const fn new(version: &'static str, runs: &'static [i64]) -> Self {
        Self { version, runs }
    }

    pub const fn empty() -> Self {
        Self::new("empty", &[])
    }

    pub fn contains(&self, run: i64) -> bool {
        self.runs.binary_search(&run).is_ok()
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn runs(&self) -> &'static [i64] {
        self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RunFilter – the pair of tables shared by both cleaners
// ---------------------------------------------------------------------------

/// The exclusion tables handed to both cleaners.
///
/// The car cleaner drops `runs`; the reading cleaner drops `reading_runs`.
/// Passing the same `RunFilter` to both keeps the two tables consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunFilter {
    pub runs: ExclusionSet,
    pub reading_runs: ExclusionSet,
}

impl Default for RunFilter {
    fn default() -> Self {
        Self {
            runs: ExclusionSet::new(EXCLUSIONS_VERSION, HISTORICAL_EXCLUSIONS),
            reading_runs: ExclusionSet::new(EXCLUSIONS_VERSION, READING_EXCLUSIONS),
        }
    }
}

impl RunFilter {
    /// A filter that drops nothing.
    pub const fn none() -> Self {
        Self {
            runs: ExclusionSet::empty(),
            reading_runs: ExclusionSet::empty(),
        }
    }
}

// ---------------------------------------------------------------------------
// Run-membership predicates
// ---------------------------------------------------------------------------

/// Return indices of rows whose run is not excluded.
pub fn retained_indices<T>(
    rows: &[T],
    exclusions: &ExclusionSet,
    run_of: impl Fn(&T) -> i64,
) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| !exclusions.contains(run_of(row)))
        .map(|(i, _)| i)
        .collect()
}

/// Keep only rows whose run id is in `runs`, preserving order.
pub fn select_runs<T: Clone>(rows: &[T], runs: &BTreeSet<i64>, run_of: impl Fn(&T) -> i64) -> Vec<T> {
    rows.iter()
        .filter(|row| runs.contains(&run_of(row)))
        .cloned()
        .collect()
}
