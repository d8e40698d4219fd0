//! 対象サイト定義
//!
//! URLs and CSS selectors of the target application. Everything the runner
//! clicks or types into is looked up here, so a markup change on the site
//! only needs a `site` block in config.json.

use pavement_entry_common::SectionField;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteProfile {
    /// page that shows the login form
    pub login_url: String,
    pub login: LoginSelectors,
    pub workspace: WorkspaceSelectors,
    pub section_form: SectionFormSelectors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginSelectors {
    pub username: String,
    pub password: String,
    pub submit: String,
}

/// Menu path to the database picker and back to the section list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceSelectors {
    pub admin_menu_toggle: String,
    /// visible once the admin menu is expanded
    pub admin_menu_open: String,
    pub open_database_link: String,
    pub database_dropdown: String,
    pub sections_menu_toggle: String,
    pub sections_menu_open: String,
    pub section_list_link: String,
    /// visible once the section list has rendered
    pub section_list_ready: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionFormSelectors {
    pub add_button: String,
    /// visible once the add-section form has rendered
    pub form_ready: String,
    pub save_button: String,
    /// application error dialog shown after a rejected save
    pub error_dialog: String,
    pub error_message: String,
    pub error_dismiss: String,
    /// form controls, filled in this order
    pub fields: Vec<FieldBinding>,
}

/// How a form control receives its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputKind {
    /// typed as-is
    Text,
    /// `<select>` resolved by fuzzy match against its live options
    Choice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldBinding {
    pub field: SectionField,
    pub selector: String,
    #[serde(default = "default_input_kind")]
    pub input: InputKind,
}

fn default_input_kind() -> InputKind {
    InputKind::Text
}

impl FieldBinding {
    pub fn text(field: SectionField, selector: &str) -> Self {
        Self {
            field,
            selector: selector.to_string(),
            input: InputKind::Text,
        }
    }

    pub fn choice(field: SectionField, selector: &str) -> Self {
        Self {
            field,
            selector: selector.to_string(),
            input: InputKind::Choice,
        }
    }
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self::streetsaver()
    }
}

impl Default for LoginSelectors {
    fn default() -> Self {
        Self::streetsaver()
    }
}

impl Default for WorkspaceSelectors {
    fn default() -> Self {
        Self::streetsaver()
    }
}

impl Default for SectionFormSelectors {
    fn default() -> Self {
        Self::streetsaver()
    }
}

impl SiteProfile {
    /// StreetSaver online (ASP.NET WebForms markup)
    pub fn streetsaver() -> Self {
        Self {
            login_url: "https://demo.streetsaver.com/Forms/PavementSections/Section?linkid=linkSection"
                .into(),
            login: LoginSelectors::streetsaver(),
            workspace: WorkspaceSelectors::streetsaver(),
            section_form: SectionFormSelectors::streetsaver(),
        }
    }
}

impl LoginSelectors {
    fn streetsaver() -> Self {
        Self {
            username: "#Email".into(),
            password: "#Password".into(),
            submit: "#ContentPlaceHolder1_btnLogin".into(),
        }
    }
}

impl WorkspaceSelectors {
    fn streetsaver() -> Self {
        Self {
            admin_menu_toggle: "#toggleSysAdmin".into(),
            admin_menu_open: "#sysadmin.menu-dropdown.collapse.show".into(),
            open_database_link: "#linkDBOpen".into(),
            database_dropdown: "#cboDBName".into(),
            sections_menu_toggle: "#togglePavementSections".into(),
            sections_menu_open: "#pavementSections.menu-dropdown.collapse.show".into(),
            section_list_link: "#linkRdNames".into(),
            section_list_ready: "#ctl00_ContentPlaceHolder1_grdEDIT_grdData".into(),
        }
    }
}

impl SectionFormSelectors {
    fn streetsaver() -> Self {
        use SectionField::*;

        let p = "#ctl00_ContentPlaceHolder1_";
        let sel = |id: &str| format!("{}{}", p, id);

        Self {
            add_button: sel("btnAddSection"),
            form_ready: sel("pnlSectionEdit"),
            save_button: sel("btnSaveSection"),
            error_dialog: "#errorModal.show".into(),
            error_message: "#errorModal .modal-body".into(),
            error_dismiss: "#errorModal button[data-dismiss='modal']".into(),
            fields: vec![
                FieldBinding::choice(StreetNameLotLocation, &sel("cboStreetName")),
                FieldBinding::text(StreetLotId, &sel("txtStreetID")),
                FieldBinding::text(SectionId, &sel("txtSectionID")),
                FieldBinding::text(BeginLocation, &sel("txtBeginLocation")),
                FieldBinding::text(BeginPoint, &sel("txtBeginPoint")),
                FieldBinding::text(EndLocation, &sel("txtEndLocation")),
                FieldBinding::text(EndPoint, &sel("txtEndPoint")),
                FieldBinding::text(NumLanes, &sel("txtLanes")),
                FieldBinding::choice(FunctionalClass, &sel("cboFunctionalClass")),
                FieldBinding::text(Length, &sel("txtLength")),
                FieldBinding::text(Width, &sel("txtWidth")),
                FieldBinding::text(Area, &sel("txtArea")),
                FieldBinding::choice(SurfaceType, &sel("cboSurfaceType")),
                FieldBinding::choice(ParkingLotType, &sel("cboLotType")),
                FieldBinding::text(SlabLength, &sel("txtSlabLength")),
                FieldBinding::text(SlabWidth, &sel("txtSlabWidth")),
                FieldBinding::text(NumSlabs, &sel("txtSlabs")),
                FieldBinding::text(TrafficIndex, &sel("txtTI")),
                FieldBinding::text(Adt, &sel("txtADT")),
                FieldBinding::choice(AreaId, &sel("cboAreaID")),
                FieldBinding::text(ShoulderWidth, &sel("txtShoulderWidth")),
                FieldBinding::choice(FundSource, &sel("cboFundSource")),
                FieldBinding::text(EffectiveDate, &sel("txtEffectiveDate")),
                FieldBinding::text(GeneralCode, &sel("txtGeneralCode")),
                FieldBinding::text(Comments, &sel("txtComments")),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streetsaver_choice_fields() {
        let profile = SiteProfile::streetsaver();
        let choices: Vec<SectionField> = profile
            .section_form
            .fields
            .iter()
            .filter(|b| b.input == InputKind::Choice)
            .map(|b| b.field)
            .collect();
        assert!(choices.contains(&SectionField::StreetNameLotLocation));
        assert!(choices.contains(&SectionField::SurfaceType));
        assert!(choices.contains(&SectionField::FunctionalClass));
        assert!(!choices.contains(&SectionField::Area));
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let json = r##"{"login": {"username": "#UserName"}, "loginUrl": "https://example.test/login"}"##;
        let profile: SiteProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.login.username, "#UserName");
        assert_eq!(profile.login.password, "#Password");
        assert_eq!(profile.workspace.database_dropdown, "#cboDBName");
        assert_eq!(profile.login_url, "https://example.test/login");
    }

    #[test]
    fn test_field_binding_defaults_to_text() {
        let json = r##"{"field": "comments", "selector": "#c"}"##;
        let binding: FieldBinding = serde_json::from_str(json).unwrap();
        assert_eq!(binding, FieldBinding::text(SectionField::Comments, "#c"));
    }
}
