use super::*;

use std::collections::BTreeSet;

use ingest::{Commune, Departement, Geometry, Region, Snapshot};

use crate::types::ValidationError;

fn region(code: &str, nom: &str) -> Region {
    Region {
        code: code.into(),
        nom: nom.into(),
    }
}

fn departement(code: &str, nom: &str, code_region: &str) -> Departement {
    Departement {
        code: code.into(),
        nom: nom.into(),
        code_region: code_region.into(),
    }
}

fn commune(code: &str, nom: &str, postal: &[&str], dep: &str, reg: &str) -> Commune {
    Commune {
        code: code.into(),
        nom: nom.into(),
        codes_postaux: postal.iter().map(|p| p.to_string()).collect(),
        population: Some(1_000),
        code_departement: Some(dep.into()),
        code_region: reg.into(),
        centre: Geometry::Point {
            coordinates: [2.0, 48.0],
        },
        contour: None,
        surface: None,
    }
}

fn snapshot() -> Snapshot {
    Snapshot {
        regions: vec![
            region("11", "Île-de-France"),
            region("28", "Normandie"),
            region("44", "Grand Est"),
            region("24", "Centre-Val de Loire"),
        ],
        departements: vec![
            departement("75", "Paris", "11"),
            departement("93", "Seine-Saint-Denis", "11"),
            departement("27", "Eure", "28"),
            departement("14", "Calvados", "28"),
            departement("55", "Meuse", "44"),
            departement("28", "Eure-et-Loir", "24"),
        ],
        communes: vec![
            commune("75056", "Paris", &["75001", "75002"], "75", "11"),
            commune("93066", "Saint-Denis", &["93200", "93210"], "93", "11"),
            commune("27229", "Évreux", &["27000"], "27", "28"),
            commune("14118", "Caen", &["14000"], "14", "28"),
            commune("55001", "Abainville", &["55130"], "55", "44"),
            commune("55215", "Gondrecourt-le-Château", &["55130"], "55", "44"),
            commune("28134", "Dreux", &["28100"], "28", "24"),
        ],
    }
}

fn matcher_with(cfg: MatchConfig) -> Matcher {
    let index = GeoIndex::build(snapshot()).expect("index builds");
    Matcher::new(Arc::new(index), &CanonicalizeConfig::default(), cfg).expect("matcher builds")
}

fn matcher() -> Matcher {
    matcher_with(MatchConfig::default())
}

fn codes(matcher: &Matcher, result: &ResultSet) -> Vec<String> {
    result
        .codes(matcher.index())
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[test]
fn query_without_criteria_is_rejected() {
    let m = matcher();
    let err = m
        .query(&QueryRequest::new(EntityKind::Commune))
        .expect_err("no criteria");
    assert_eq!(err, MatchError::NoCriteria);
    assert!(err.is_client_error());
}

#[test]
fn code_filter_returns_single_entity() {
    let m = matcher();
    let result = m
        .query(&QueryRequest::new(EntityKind::Commune).with_code("55001"))
        .expect("query");
    assert_eq!(codes(&m, &result), vec!["55001"]);
    assert_eq!(result.hits[0].score, None);
}

#[test]
fn postal_code_filter_lists_all_carriers_in_code_order() {
    let m = matcher();
    let result = m
        .query(&QueryRequest::new(EntityKind::Commune).with_code_postal("55130"))
        .expect("query");
    assert_eq!(codes(&m, &result), vec!["55001", "55215"]);

    let single = m
        .query(&QueryRequest::new(EntityKind::Commune).with_code_postal("28100"))
        .expect("query");
    let found: Vec<&str> = single
        .entities(m.index())
        .map(|(entity, _)| entity.nom())
        .collect();
    assert_eq!(found, vec!["Dreux"]);
}

#[test]
fn parent_filters_intersect() {
    let m = matcher();
    let by_region = m
        .query(&QueryRequest::new(EntityKind::Departement).with_code_region("11"))
        .expect("query");
    assert_eq!(codes(&m, &by_region), vec!["75", "93"]);

    let both = m
        .query(
            &QueryRequest::new(EntityKind::Commune)
                .with_code_region("44")
                .with_code_postal("55130")
                .with_code("55215"),
        )
        .expect("query");
    assert_eq!(codes(&m, &both), vec!["55215"]);

    let disjoint = m
        .query(
            &QueryRequest::new(EntityKind::Commune)
                .with_code_region("28")
                .with_code_postal("55130"),
        )
        .expect("query");
    assert!(disjoint.is_empty());
}

#[test]
fn unknown_parent_in_filter_is_empty_not_error() {
    let m = matcher();
    let result = m
        .query(&QueryRequest::new(EntityKind::Departement).with_code_region("99"))
        .expect("query");
    assert!(result.is_empty());
}

#[test]
fn name_filter_ranks_and_scores() {
    let m = matcher();
    let result = m
        .query(&QueryRequest::new(EntityKind::Region).with_nom("normandie"))
        .expect("query");
    assert_eq!(codes(&m, &result), vec!["28"]);
    assert_eq!(result.hits[0].score, Some(1.0));

    let accents = m
        .query(&QueryRequest::new(EntityKind::Commune).with_nom("EVREUX"))
        .expect("query");
    assert_eq!(codes(&m, &accents), vec!["27229"]);
}

#[test]
fn exact_name_outranks_prefix_match() {
    let m = matcher();
    let result = m
        .query(&QueryRequest::new(EntityKind::Departement).with_nom("Eure"))
        .expect("query");
    assert_eq!(codes(&m, &result), vec!["27", "28"]);
    let scores: Vec<f64> = result.hits.iter().filter_map(|h| h.score).collect();
    assert!(scores[0] > scores[1]);
}

#[test]
fn name_filter_respects_exact_filters() {
    let m = matcher();
    let result = m
        .query(
            &QueryRequest::new(EntityKind::Departement)
                .with_nom("Eure")
                .with_code_region("24"),
        )
        .expect("query");
    assert_eq!(codes(&m, &result), vec!["28"]);
}

#[test]
fn blank_name_is_no_criteria() {
    let m = matcher();
    let err = m
        .query(&QueryRequest::new(EntityKind::Commune).with_nom("   "))
        .expect_err("blank name");
    assert_eq!(err, MatchError::NoCriteria);
}

fn code_set(m: &Matcher, req: &QueryRequest) -> BTreeSet<String> {
    codes(m, &m.query(req).expect("query")).into_iter().collect()
}

#[test]
fn combined_filters_equal_intersection_of_single_filters() {
    let m = matcher();
    let filters: [(bool, fn(QueryRequest) -> QueryRequest); 5] = [
        (false, |r| r.with_code_region("11")),
        (false, |r| r.with_code_departement("93")),
        (false, |r| r.with_code_postal("93200")),
        (true, |r| r.with_nom("saint")),
        (true, |r| r.with_nom("paris")),
    ];
    let base = || QueryRequest::new(EntityKind::Commune);

    for (i, (first_is_name, first)) in filters.iter().enumerate() {
        for (second_is_name, second) in &filters[i + 1..] {
            if *first_is_name && *second_is_name {
                continue;
            }
            let expected: BTreeSet<String> = code_set(&m, &first(base()))
                .intersection(&code_set(&m, &second(base())))
                .cloned()
                .collect();

            let combined = second(first(base()));
            let reversed = first(second(base()));
            assert_eq!(code_set(&m, &combined), expected, "{combined:?}");
            assert_eq!(
                m.query(&combined).expect("query"),
                m.query(&reversed).expect("query")
            );
        }
    }
}

#[test]
fn limit_truncates_after_ordering() {
    let m = matcher();
    let result = m
        .query(
            &QueryRequest::new(EntityKind::Commune)
                .with_code_postal("55130")
                .with_limit(1),
        )
        .expect("query");
    assert_eq!(codes(&m, &result), vec!["55001"]);
}

#[test]
fn configured_cap_bounds_requested_limit() {
    let m = matcher_with(MatchConfig {
        max_results: Some(1),
        ..MatchConfig::default()
    });
    let result = m
        .query(
            &QueryRequest::new(EntityKind::Departement)
                .with_code_region("28")
                .with_limit(10),
        )
        .expect("query");
    assert_eq!(result.len(), 1);
}

#[test]
fn inapplicable_filter_is_validation_error() {
    let m = matcher();
    let err = m
        .query(&QueryRequest::new(EntityKind::Region).with_code_postal("28100"))
        .expect_err("invalid filter");
    assert!(matches!(
        err,
        MatchError::Validation(ValidationError::UnsupportedFilter { .. })
    ));
}

#[test]
fn get_distinguishes_missing_codes() {
    let m = matcher();
    assert_eq!(m.get(EntityKind::Region, "28").expect("found").nom(), "Normandie");
    let err = m.get(EntityKind::Commune, "00000").expect_err("missing");
    assert!(err.is_not_found());
}

#[test]
fn children_follow_hierarchy() {
    let m = matcher();
    let departements = m.children(EntityKind::Region, "28", None).expect("region exists");
    assert_eq!(departements.kind, EntityKind::Departement);
    assert_eq!(codes(&m, &departements), vec!["14", "27"]);

    let communes = m.children(EntityKind::Departement, "55", None).expect("departement exists");
    assert_eq!(codes(&m, &communes), vec!["55001", "55215"]);

    let by_region = m
        .children_of_kind(EntityKind::Region, "11", EntityKind::Commune, None)
        .expect("region exists");
    assert_eq!(codes(&m, &by_region), vec!["75056", "93066"]);
}

#[test]
fn children_of_unknown_parent_is_not_found() {
    let m = matcher();
    let err = m.children(EntityKind::Region, "666", None).expect_err("missing parent");
    assert_eq!(
        err,
        MatchError::ParentNotFound {
            kind: EntityKind::Region,
            code: "666".into()
        }
    );
    assert!(m.children(EntityKind::Commune, "55001", None).is_err());
}

#[test]
fn all_lists_every_entity_by_code() {
    let m = matcher();
    let regions = m.all(EntityKind::Region, None).expect("all");
    assert_eq!(codes(&m, &regions), vec!["11", "24", "28", "44"]);
}

#[test]
fn listings_honour_limit() {
    let m = matcher();
    let regions = m.all(EntityKind::Region, Some(2)).expect("all");
    assert_eq!(codes(&m, &regions), vec!["11", "24"]);

    let communes = m
        .children(EntityKind::Departement, "55", Some(1))
        .expect("departement exists");
    assert_eq!(codes(&m, &communes), vec!["55001"]);

    let err = m.all(EntityKind::Region, Some(0)).expect_err("zero limit");
    assert_eq!(err, MatchError::Validation(ValidationError::InvalidLimit));
}

#[test]
fn repeated_queries_are_identical() {
    let m = matcher();
    let req = QueryRequest::new(EntityKind::Commune).with_nom("saint");
    let first = m.query(&req).expect("query");
    for _ in 0..5 {
        assert_eq!(m.query(&req).expect("query"), first);
    }
}

#[test]
fn intersect_sorted_keeps_common_slots() {
    assert_eq!(intersect_sorted(&[1, 3, 5, 7], &[2, 3, 7, 9]), vec![3, 7]);
    assert!(intersect_sorted(&[], &[1]).is_empty());
}
