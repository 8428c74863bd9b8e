use std::collections::BTreeMap;

/// Grouping key of every aggregate. `region` is `None` for rows whose country
/// had no mapping; those still form a group of their own.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub date: String,
    pub region: Option<String>,
}

impl GroupKey {
    pub fn new(date: impl Into<String>, region: Option<&str>) -> Self {
        GroupKey {
            date: date.into(),
            region: region.map(str::to_string),
        }
    }
}

/// Per-(Date, Region) sum of one metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionAggregate {
    sums: BTreeMap<GroupKey, f64>,
}

impl RegionAggregate {
    /// Missing values still open their group but add nothing to it.
    pub fn add(&mut self, key: GroupKey, value: Option<f64>) {
        *self.sums.entry(key).or_insert(0.0) += value.unwrap_or(0.0);
    }

    pub fn len(&self) -> usize {
        self.sums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, f64)> {
        self.sums.iter().map(|(k, v)| (k, *v))
    }
}

impl FromIterator<(GroupKey, Option<f64>)> for RegionAggregate {
    fn from_iter<I: IntoIterator<Item = (GroupKey, Option<f64>)>>(iter: I) -> Self {
        let mut agg = RegionAggregate::default();
        for (k, v) in iter {
            agg.add(k, v);
        }
        agg
    }
}

/// Units and revenue for one (Date, Region).
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub key: GroupKey,
    pub units: f64,
    pub revenue: f64,
}

/// Outer join on the group key; a side without the key contributes `0.0`.
/// Rows come out in key order.
pub fn outer_merge(units: &RegionAggregate, revenue: &RegionAggregate) -> Vec<MergedRow> {
    let mut merged: BTreeMap<&GroupKey, (f64, f64)> = BTreeMap::new();
    for (k, v) in units.iter() {
        merged.entry(k).or_insert((0.0, 0.0)).0 = v;
    }
    for (k, v) in revenue.iter() {
        merged.entry(k).or_insert((0.0, 0.0)).1 = v;
    }
    merged
        .into_iter()
        .map(|(k, (units, revenue))| MergedRow {
            key: k.clone(),
            units,
            revenue,
        })
        .collect()
}
