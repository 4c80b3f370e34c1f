//! The shared LIDO record implementation.
//!
//! A [`LidoRecord`] parses its XML once into owned values. All getters work
//! on those values, so no tree is kept alive after construction.

use std::sync::{Arc, OnceLock};

use roxmltree::{Document, Node};

use super::{filter_actor_id, Actor, ActorIdScheme, RecordModel, RecordSettings};
use crate::config::DEFAULT_RECORD_VARIANT;
use crate::daterange::DateValues;
use crate::error::{LidoError, Result};
use crate::normalize::trim_xml_whitespace;
use crate::xml::{
    find_all_by_path, find_by_path, find_children, find_descendant, get_text, text_by_path,
    texts_by_path,
};

const DESCRIPTIVE: &str = "descriptiveMetadata";
const IDENTIFICATION: &str = "descriptiveMetadata/objectIdentificationWrap";
const RELATION: &str = "descriptiveMetadata/objectRelationWrap";
const RECORD_WRAP: &str = "administrativeMetadata/recordWrap";

#[derive(Debug, Clone, Default)]
struct ActorInRoleData {
    name: String,
    role: String,
    actor_id: String,
}

#[derive(Debug, Clone, Default)]
struct EventActorData {
    display: String,
    roles: Vec<ActorInRoleData>,
}

#[derive(Debug, Clone, Default)]
struct EventData {
    types: Vec<String>,
    actors: Vec<EventActorData>,
    display_date: String,
    earliest_date: String,
    latest_date: String,
    period: String,
    materials: Vec<String>,
}

impl EventData {
    fn from_node(event: Node<'_, '_>) -> Self {
        let actors = find_children(event, "eventActor")
            .map(|actor| EventActorData {
                display: text_by_path(actor, "displayActorInRole"),
                roles: find_children(actor, "actorInRole")
                    .map(|role| ActorInRoleData {
                        name: text_by_path(role, "actor/nameActorSet/appellationValue"),
                        role: text_by_path(role, "roleActor/term"),
                        actor_id: text_by_path(role, "actor/actorID"),
                    })
                    .collect(),
            })
            .collect();

        Self {
            types: texts_by_path(event, "eventType/term"),
            actors,
            display_date: text_by_path(event, "eventDate/displayDate"),
            earliest_date: text_by_path(event, "eventDate/date/earliestDate"),
            latest_date: text_by_path(event, "eventDate/date/latestDate"),
            period: text_by_path(event, "periodName/term"),
            materials: texts_by_path(event, "eventMaterialsTech/displayMaterialsTech"),
        }
    }

    fn matches(&self, filter: Option<&[&str]>) -> bool {
        match filter {
            None => true,
            Some(wanted) => self
                .types
                .iter()
                .any(|t| wanted.iter().any(|w| w.eq_ignore_ascii_case(t))),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct RelatedWorkData {
    relation_types: Vec<String>,
    object_id: String,
}

#[derive(Debug, Clone, Default)]
struct RepositoryData {
    name_ids: Vec<String>,
    work_ids: Vec<String>,
    places: Vec<String>,
}

/// Owned values extracted from one `lido` element.
#[derive(Debug, Clone, Default)]
struct LidoData {
    rec_id: String,
    events: Vec<EventData>,
    titles: Vec<String>,
    work_types: Vec<String>,
    descriptions: Vec<String>,
    measurements: Vec<String>,
    subjects: Vec<String>,
    related_works: Vec<RelatedWorkData>,
    repositories: Vec<RepositoryData>,
    record_source_ids: Vec<String>,
    record_info_link: String,
    credit_lines: Vec<String>,
    link_resources: Vec<String>,
}

impl LidoData {
    fn from_node(lido: Node<'_, '_>) -> Self {
        let events = find_all_by_path(lido, &format!("{DESCRIPTIVE}/eventWrap/eventSet/event"))
            .into_iter()
            .map(EventData::from_node)
            .collect();

        let related_works = find_all_by_path(
            lido,
            &format!("{RELATION}/relatedWorksWrap/relatedWorkSet"),
        )
        .into_iter()
        .map(|set| RelatedWorkData {
            relation_types: texts_by_path(set, "relatedWorkRelType/term"),
            object_id: text_by_path(set, "relatedWork/object/objectID"),
        })
        .collect();

        let repositories = find_all_by_path(
            lido,
            &format!("{IDENTIFICATION}/repositoryWrap/repositorySet"),
        )
        .into_iter()
        .map(|set| RepositoryData {
            name_ids: texts_by_path(set, "repositoryName/legalBodyID"),
            work_ids: texts_by_path(set, "workID"),
            places: texts_by_path(set, "repositoryLocation/namePlaceSet/appellationValue"),
        })
        .collect();

        Self {
            rec_id: find_by_path(lido, "lidoRecID").map(get_text).unwrap_or_default(),
            events,
            titles: texts_by_path(lido, &format!("{IDENTIFICATION}/titleWrap/titleSet/appellationValue")),
            work_types: texts_by_path(
                lido,
                &format!("{DESCRIPTIVE}/objectClassificationWrap/objectWorkTypeWrap/objectWorkType/term"),
            ),
            descriptions: texts_by_path(
                lido,
                &format!("{IDENTIFICATION}/objectDescriptionWrap/objectDescriptionSet/descriptiveNoteValue"),
            ),
            measurements: texts_by_path(
                lido,
                &format!("{IDENTIFICATION}/objectMeasurementsWrap/objectMeasurementsSet/displayObjectMeasurements"),
            ),
            subjects: texts_by_path(
                lido,
                &format!("{RELATION}/subjectWrap/subjectSet/subject/subjectConcept/term"),
            ),
            related_works,
            repositories,
            record_source_ids: texts_by_path(lido, &format!("{RECORD_WRAP}/recordSource/legalBodyID")),
            record_info_link: text_by_path(lido, &format!("{RECORD_WRAP}/recordInfoSet/recordInfoLink")),
            credit_lines: texts_by_path(lido, "administrativeMetadata/rightsWorkWrap/rightsWorkSet/creditLine"),
            link_resources: texts_by_path(
                lido,
                "administrativeMetadata/resourceWrap/resourceSet/resourceRepresentation/linkResource",
            ),
        }
    }
}

/// Generic LIDO record, also the shared base of every source variant.
#[derive(Debug)]
pub struct LidoRecord {
    xml: String,
    data: LidoData,
    settings: Arc<RecordSettings>,
    actors: OnceLock<Vec<Actor>>,
}

impl LidoRecord {
    /// Parse a transformed unit.
    ///
    /// The unit may be a bare `lido` element or any wrapper around one; the
    /// first `lido` element found is used.
    ///
    /// # Errors
    /// `XmlParse` for malformed XML, `MissingElement` if there is no `lido`
    /// element.
    pub fn parse(xml: String, settings: Arc<RecordSettings>) -> Result<Self> {
        let data = {
            let doc = Document::parse(&xml)?;
            let lido = find_descendant(doc.root_element(), "lido").ok_or_else(|| {
                LidoError::MissingElement {
                    element: "lido".to_string(),
                    context: "transformed unit".to_string(),
                }
            })?;
            LidoData::from_node(lido)
        };

        Ok(Self {
            xml,
            data,
            settings,
            actors: OnceLock::new(),
        })
    }

    /// Boxed constructor for the resolver.
    pub fn boxed(xml: String, settings: Arc<RecordSettings>) -> Result<Box<dyn RecordModel>> {
        Ok(Box::new(Self::parse(xml, settings)?))
    }

    #[must_use]
    pub fn settings(&self) -> &RecordSettings {
        &self.settings
    }

    /// Native record id (`lidoRecID`), empty if absent.
    #[must_use]
    pub fn rec_id(&self) -> &str {
        &self.data.rec_id
    }

    /// Scan events and their actors.
    ///
    /// For every event actor the first actor-in-role entry that has a name
    /// (and a matching role, if a role filter is given) is used. Actors
    /// without a name are skipped.
    pub fn scan_actors(&self, events: Option<&[&str]>, roles: Option<&[&str]>) -> Vec<Actor> {
        let role_matches = |role: &str| match roles {
            None => true,
            Some(wanted) => wanted.iter().any(|w| w.eq_ignore_ascii_case(role)),
        };

        self.data
            .events
            .iter()
            .filter(|event| event.matches(events))
            .flat_map(|event| event.actors.iter())
            .filter_map(|actor| {
                let entry = actor
                    .roles
                    .iter()
                    .find(|r| !r.name.is_empty() && role_matches(&r.role))?;
                Some(Actor {
                    display_label: actor.display.clone(),
                    name: entry.name.clone(),
                    role: entry.role.clone(),
                    external_id: filter_actor_id(&entry.actor_id, ActorIdScheme::Gnd),
                })
            })
            .collect()
    }

    /// All actors, computed on first use.
    pub fn all_actors(&self) -> &[Actor] {
        self.actors.get_or_init(|| self.scan_actors(None, None))
    }

    /// Harvest date values from the events.
    ///
    /// The first event with both earliest and latest date supplies them and
    /// ends the scan. Otherwise the first display date and period name seen
    /// are kept.
    pub fn date_values(&self, events: Option<&[&str]>) -> DateValues {
        let mut values = DateValues::default();
        for event in self.data.events.iter().filter(|e| e.matches(events)) {
            if !event.earliest_date.is_empty() && !event.latest_date.is_empty() {
                values.start.clone_from(&event.earliest_date);
                values.end.clone_from(&event.latest_date);
                break;
            }
            if values.display.is_empty() {
                values.display.clone_from(&event.display_date);
            }
            if values.period.is_empty() {
                values.period.clone_from(&event.period);
            }
        }
        values
    }

    /// Legal body ids of the record source.
    #[must_use]
    pub fn record_source_ids(&self) -> &[String] {
        &self.data.record_source_ids
    }

    /// Legal body ids of all repository names.
    pub fn repository_name_ids(&self) -> Vec<String> {
        self.data
            .repositories
            .iter()
            .flat_map(|r| r.name_ids.iter().cloned())
            .collect()
    }

    /// Place names of all repository locations.
    pub fn repository_places(&self) -> Vec<String> {
        self.data
            .repositories
            .iter()
            .flat_map(|r| r.places.iter().cloned())
            .collect()
    }

    /// Inventory numbers of all repositories.
    pub fn work_ids(&self) -> Vec<String> {
        self.data
            .repositories
            .iter()
            .flat_map(|r| r.work_ids.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn record_info_link(&self) -> &str {
        &self.data.record_info_link
    }

    /// First non-empty object id among related works with an allowed
    /// relation type.
    pub fn related_work_display_object(&self, relation_types: &[&str]) -> String {
        self.data
            .related_works
            .iter()
            .filter(|work| {
                work.relation_types
                    .iter()
                    .any(|t| relation_types.iter().any(|w| w.eq_ignore_ascii_case(t)))
            })
            .find(|work| !work.object_id.is_empty())
            .map(|work| work.object_id.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn titles(&self) -> &[String] {
        &self.data.titles
    }

    #[must_use]
    pub fn work_types(&self) -> &[String] {
        &self.data.work_types
    }

    #[must_use]
    pub fn descriptions(&self) -> &[String] {
        &self.data.descriptions
    }

    #[must_use]
    pub fn measurements(&self) -> &[String] {
        &self.data.measurements
    }

    #[must_use]
    pub fn subjects(&self) -> &[String] {
        &self.data.subjects
    }

    /// Materials and techniques of the matching events.
    pub fn materials(&self, events: Option<&[&str]>) -> Vec<String> {
        self.data
            .events
            .iter()
            .filter(|e| e.matches(events))
            .flat_map(|e| e.materials.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn credit_lines(&self) -> &[String] {
        &self.data.credit_lines
    }

    #[must_use]
    pub fn link_resources(&self) -> &[String] {
        &self.data.link_resources
    }

    /// The transformed unit with whitespace between tags removed.
    pub fn to_xml(&self) -> String {
        trim_xml_whitespace(&self.xml)
    }
}

impl RecordModel for LidoRecord {
    fn base(&self) -> &LidoRecord {
        self
    }

    fn source_id(&self) -> &str {
        DEFAULT_RECORD_VARIANT
    }

    fn default_language(&self) -> &str {
        "en"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RECORD: &str = r#"<lido:lidoWrap xmlns:lido="http://www.lido-schema.org">
  <lido:lido>
    <lido:lidoRecID lido:type="local">DE-Mb112/lido-obj00154983</lido:lidoRecID>
    <lido:descriptiveMetadata xml:lang="de">
      <lido:objectClassificationWrap>
        <lido:objectWorkTypeWrap>
          <lido:objectWorkType><lido:term>Gemälde</lido:term></lido:objectWorkType>
        </lido:objectWorkTypeWrap>
      </lido:objectClassificationWrap>
      <lido:objectIdentificationWrap>
        <lido:titleWrap>
          <lido:titleSet><lido:appellationValue>Bildnis einer Dame</lido:appellationValue></lido:titleSet>
        </lido:titleWrap>
        <lido:repositoryWrap>
          <lido:repositorySet>
            <lido:repositoryName><lido:legalBodyID>info:isil/DE-Mb112</lido:legalBodyID></lido:repositoryName>
            <lido:workID>Inv. 1234</lido:workID>
            <lido:repositoryLocation>
              <lido:namePlaceSet><lido:appellationValue>Marburg</lido:appellationValue></lido:namePlaceSet>
            </lido:repositoryLocation>
          </lido:repositorySet>
        </lido:repositoryWrap>
      </lido:objectIdentificationWrap>
      <lido:eventWrap>
        <lido:eventSet>
          <lido:event>
            <lido:eventType><lido:term>Herstellung</lido:term></lido:eventType>
            <lido:eventActor>
              <lido:displayActorInRole>Smith, A. (Illustrator)</lido:displayActorInRole>
              <lido:actorInRole>
                <lido:actor>
                  <lido:actorID lido:source="GND">http://d-nb.info/gnd/123</lido:actorID>
                  <lido:nameActorSet><lido:appellationValue>Smith, A.</lido:appellationValue></lido:nameActorSet>
                </lido:actor>
                <lido:roleActor><lido:term>illustrator</lido:term></lido:roleActor>
              </lido:actorInRole>
            </lido:eventActor>
            <lido:eventActor>
              <lido:actorInRole>
                <lido:actor><lido:actorID>456</lido:actorID></lido:actor>
              </lido:actorInRole>
            </lido:eventActor>
            <lido:eventDate>
              <lido:displayDate>um 1900</lido:displayDate>
            </lido:eventDate>
            <lido:eventMaterialsTech><lido:displayMaterialsTech>Öl auf Leinwand</lido:displayMaterialsTech></lido:eventMaterialsTech>
          </lido:event>
        </lido:eventSet>
        <lido:eventSet>
          <lido:event>
            <lido:eventType><lido:term>Erwerb</lido:term></lido:eventType>
            <lido:eventActor>
              <lido:actorInRole>
                <lido:actor><lido:nameActorSet><lido:appellationValue>Jones, B.</lido:appellationValue></lido:nameActorSet></lido:actor>
                <lido:roleActor><lido:term>author</lido:term></lido:roleActor>
              </lido:actorInRole>
            </lido:eventActor>
            <lido:eventDate>
              <lido:date><lido:earliestDate>1910</lido:earliestDate><lido:latestDate>1912</lido:latestDate></lido:date>
            </lido:eventDate>
          </lido:event>
        </lido:eventSet>
      </lido:eventWrap>
      <lido:objectRelationWrap>
        <lido:relatedWorksWrap>
          <lido:relatedWorkSet>
            <lido:relatedWorkRelType><lido:term>relatedWork</lido:term></lido:relatedWorkRelType>
          </lido:relatedWorkSet>
          <lido:relatedWorkSet>
            <lido:relatedWork>
              <lido:displayObject>Sammlung X</lido:displayObject>
              <lido:object><lido:objectID>coll-1</lido:objectID></lido:object>
            </lido:relatedWork>
            <lido:relatedWorkRelType><lido:term>relatedWork</lido:term></lido:relatedWorkRelType>
          </lido:relatedWorkSet>
        </lido:relatedWorksWrap>
      </lido:objectRelationWrap>
    </lido:descriptiveMetadata>
    <lido:administrativeMetadata xml:lang="de">
      <lido:recordWrap>
        <lido:recordSource><lido:legalBodyID>info:isil/DE-MUS-1</lido:legalBodyID></lido:recordSource>
        <lido:recordInfoSet><lido:recordInfoLink>https://example.org/obj/154983</lido:recordInfoLink></lido:recordInfoSet>
      </lido:recordWrap>
    </lido:administrativeMetadata>
  </lido:lido>
</lido:lidoWrap>"#;

    fn record() -> LidoRecord {
        LidoRecord::parse(RECORD.to_string(), Arc::new(RecordSettings::default())).unwrap()
    }

    #[test]
    fn test_parse_extracts_rec_id() {
        assert_eq!(record().rec_id(), "DE-Mb112/lido-obj00154983");
    }

    #[test]
    fn test_parse_without_lido_element() {
        let err = LidoRecord::parse("<x/>".to_string(), Arc::new(RecordSettings::default()))
            .unwrap_err();
        assert!(matches!(err, LidoError::MissingElement { .. }));
    }

    #[test]
    fn test_parse_malformed() {
        let err = LidoRecord::parse("<lido>".to_string(), Arc::new(RecordSettings::default()))
            .unwrap_err();
        assert!(matches!(err, LidoError::XmlParse(_)));
    }

    #[test]
    fn test_scan_actors_skips_nameless() {
        let actors = record().scan_actors(None, None);
        assert_eq!(actors.len(), 2);
        assert_eq!(
            actors[0],
            Actor {
                display_label: "Smith, A. (Illustrator)".to_string(),
                name: "Smith, A.".to_string(),
                role: "illustrator".to_string(),
                external_id: "123".to_string(),
            }
        );
        assert_eq!(actors[1].name, "Jones, B.");
    }

    #[test]
    fn test_scan_actors_event_filter_case_insensitive() {
        let actors = record().scan_actors(Some(&["erwerb"][..]), None);
        assert_eq!(actors.len(), 1);
        assert_eq!(actors[0].name, "Jones, B.");
    }

    #[test]
    fn test_scan_actors_role_filter() {
        let actors = record().scan_actors(None, Some(&["Illustrator"][..]));
        assert_eq!(actors.len(), 1);
        assert_eq!(actors[0].name, "Smith, A.");
    }

    #[test]
    fn test_scan_actors_uses_first_matching_named_entry() {
        let xml = "<lido><lidoRecID>r1</lidoRecID><descriptiveMetadata><eventWrap><eventSet><event>\
             <eventActor>\
             <actorInRole><actor><actorID>1</actorID></actor><roleActor><term>Maler</term></roleActor></actorInRole>\
             <actorInRole><actor><actorID>2</actorID><nameActorSet><appellationValue>Werkstatt Cranach</appellationValue></nameActorSet></actor>\
             <roleActor><term>Mitarbeit</term></roleActor></actorInRole>\
             <actorInRole><actor><actorID>3</actorID><nameActorSet><appellationValue>Cranach, Lucas</appellationValue></nameActorSet></actor>\
             <roleActor><term>Maler</term></roleActor></actorInRole>\
             </eventActor></event></eventSet></eventWrap></descriptiveMetadata></lido>";
        let rec = LidoRecord::parse(xml.to_string(), Arc::new(RecordSettings::default())).unwrap();

        let all = rec.scan_actors(None, None);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Werkstatt Cranach");
        assert_eq!(all[0].role, "Mitarbeit");
        assert_eq!(all[0].external_id, "2");

        let painters = rec.scan_actors(None, Some(&["maler"][..]));
        assert_eq!(painters.len(), 1);
        assert_eq!(painters[0].name, "Cranach, Lucas");
        assert_eq!(painters[0].external_id, "3");

        assert!(rec.scan_actors(None, Some(&["Stecher"][..])).is_empty());
    }

    #[test]
    fn test_date_values_point_dates_win() {
        let values = record().date_values(None);
        assert_eq!(values.start, "1910");
        assert_eq!(values.end, "1912");
        assert_eq!(values.display, "um 1900");
    }

    #[test]
    fn test_date_values_with_event_filter() {
        let values = record().date_values(Some(&["Herstellung"][..]));
        assert_eq!(values.start, "");
        assert_eq!(values.display, "um 1900");
    }

    #[test]
    fn test_repository_values() {
        let rec = record();
        assert_eq!(rec.repository_name_ids(), vec!["info:isil/DE-Mb112"]);
        assert_eq!(rec.repository_places(), vec!["Marburg"]);
        assert_eq!(rec.work_ids(), vec!["Inv. 1234"]);
        assert_eq!(rec.record_source_ids(), ["info:isil/DE-MUS-1".to_string()]);
    }

    #[test]
    fn test_related_work_display_object() {
        let rec = record();
        assert_eq!(rec.related_work_display_object(&["relatedWork"]), "coll-1");
        assert_eq!(rec.related_work_display_object(&["RELATEDWORK"]), "coll-1");
        assert_eq!(rec.related_work_display_object(&["part of"]), "");
    }

    #[test]
    fn test_misc_getters() {
        let rec = record();
        assert_eq!(rec.record_info_link(), "https://example.org/obj/154983");
        assert_eq!(rec.titles(), ["Bildnis einer Dame".to_string()]);
        assert_eq!(rec.work_types(), ["Gemälde".to_string()]);
        assert_eq!(rec.materials(None), vec!["Öl auf Leinwand"]);
        assert!(rec.to_xml().starts_with("<lido:lidoWrap"));
        assert!(!rec.to_xml().contains(">\n"));
    }
}
