use std::sync::Arc;

use anyhow::{Context, Result};
use visor_actors::chain::ChainState;
use visor_actors::headless::Playback;
use visor_actors::{
    ActorDescriptor, ActorError, ActorKind, ActorManager, HeadlessScene, PartState, Region, Roster,
    SceneBackend, MODEL_ROOT,
};
use visor_assets::MemoryAssets;

const WALK: &str = "phase_4/models/char/tt_a_ene_cgb_walk.bam";

const ROSTER: &str = r#"{"groups": [{"name": "scenarios", "entries": [
    {"kind": "cog", "name": "Telemarketer", "department": "sell", "suit": "b",
     "height": 3.75, "head_nodes": ["**/telemarketer"]},
    {"kind": "cog", "name": "Bean Counter", "department": "cash", "suit": "b",
     "height": 4.4, "head_nodes": ["**/beancounter"]},
    {"kind": "boss", "name": "Senior Vice President (VP)", "department": "sell"},
    {"kind": "generic", "name": "The Boiler",
     "model": "phase_5/models/char/ttr_r_chr_cbg_boss.bam",
     "animation_prefix": "ttr_a_chr_cbg_boss_", "scale": 0.5},
    {"kind": "generic", "name": "Broken",
     "model": "phase_5/models/char/missing.bam",
     "animation_prefix": "ttr_a_chr_cbg_boss_"}
]}]}"#;

fn assets() -> MemoryAssets {
    MemoryAssets::with_paths([
        "phase_3/models/props/drop_shadow.bam",
        "phase_3/models/gui/ttr_m_gui_gen_cogIcons.bam",
        "phase_3.5/models/char/tt_a_ene_cgb_zero.bam",
        "phase_4/models/char/tt_a_ene_cgb_walk.bam",
        "phase_4/models/char/tt_a_ene_cgb_run.bam",
        "phase_4/models/char/tt_a_ene_cgb_neutral.bam",
        "phase_4/models/char/suitB-heads.bam",
        "phase_3.5/maps/s_blazer.jpg",
        "phase_3.5/maps/s_leg.jpg",
        "phase_3.5/maps/s_sleeve.jpg",
        "phase_3.5/maps/m_blazer.jpg",
        "phase_3.5/maps/m_leg.jpg",
        "phase_3.5/maps/m_sleeve.jpg",
        "phase_5/models/char/tt_a_ene_scb_zero.bam",
        "phase_5/maps/cog_robot_tie_sales.jpg",
        "phase_5/maps/cog_robot_tie_money.jpg",
        "phase_9/models/char/sellbotBoss-head-zero.bam",
        "phase_9/models/char/sellbotBoss-torso-zero.bam",
        "phase_9/models/char/bossCog-legs-zero.bam",
        "phase_9/models/char/bossCog-treads.bam",
        "phase_9/models/char/bossCog-head-Ff_neutral.bam",
        "phase_9/models/char/bossCog-torso-Ff_neutral.bam",
        "phase_9/models/char/bossCog-legs-Ff_neutral.bam",
        "phase_5/models/char/ttr_r_chr_cbg_boss.bam",
        "phase_5/models/char/ttr_a_chr_cbg_boss_idle.bam",
    ])
}

struct Fixture {
    manager: ActorManager<HeadlessScene>,
    roster: Roster,
}

impl Fixture {
    fn new() -> Result<Self> {
        let assets = Arc::new(assets());
        let roster = Roster::from_json(ROSTER, assets.as_ref()).context("loading roster")?;
        let manager = ActorManager::new(HeadlessScene::new(assets)).context("creating manager")?;
        Ok(Fixture { manager, roster })
    }

    fn actor(&self, name: &str) -> Result<Arc<ActorDescriptor>> {
        let index = self
            .roster
            .position(name)
            .with_context(|| format!("{name} missing from roster"))?;
        let actor = self.roster.get(index).context("roster index out of range")?;
        Ok(Arc::clone(actor))
    }

    fn show(&mut self, name: &str, preserve: bool) -> Result<()> {
        let actor = self.actor(name)?;
        self.manager.set_descriptor(actor, preserve)?;
        Ok(())
    }

    fn playback(&self, part: &str) -> Option<Playback> {
        let actor = self.manager.actor()?;
        self.manager.scene().playback(actor, part).cloned()
    }
}

#[test]
fn pose_round_trip_resumes_the_same_animation() -> Result<()> {
    let mut fx = Fixture::new()?;
    fx.show("Telemarketer", false)?;
    let part = fx.manager.first_part().context("no parts")?;

    fx.manager.animate("walk", part, None);
    fx.manager.update(0.5);
    assert_eq!(fx.manager.current_frame(part), 12);

    fx.manager.set_pose_mode(true, part);
    assert!(fx.manager.is_posed(part));
    assert_eq!(
        fx.playback(MODEL_ROOT),
        Some(Playback::Posed {
            animation: "walk".into(),
            frame: 12
        })
    );

    fx.manager.set_pose_mode(false, part);
    assert!(!fx.manager.is_posed(part));
    // the engine reports nothing while the tail plays once
    assert_eq!(fx.manager.current_animation(part).as_deref(), Some("walk"));
    assert_eq!(fx.manager.current_frame(part), 12);

    fx.manager.update(0.5);
    assert_eq!(
        fx.playback(MODEL_ROOT),
        Some(Playback::Looping {
            animation: "walk".into(),
            frame: 0.0
        })
    );
    assert_eq!(fx.manager.current_animation(part).as_deref(), Some("walk"));
    Ok(())
}

#[test]
fn stepping_a_full_cycle_returns_to_the_same_frame() -> Result<()> {
    let mut fx = Fixture::new()?;
    fx.manager.scene_mut().set_frame_count(WALK, 30);
    fx.show("Telemarketer", false)?;
    let part = fx.manager.first_part().context("no parts")?;

    fx.manager.animate("walk", part, None);
    fx.manager.set_pose_mode(true, part);
    fx.manager.increment_pose(7, part);
    assert_eq!(fx.manager.current_frame(part), 7);

    for _ in 0..30 {
        fx.manager.increment_pose(1, part);
    }
    assert_eq!(fx.manager.current_frame(part), 7);

    fx.manager.increment_pose(-8, part);
    assert_eq!(fx.manager.current_frame(part), 29);
    assert_eq!(
        fx.playback(MODEL_ROOT),
        Some(Playback::Posed {
            animation: "walk".into(),
            frame: 29
        })
    );
    Ok(())
}

#[test]
fn stepping_an_unposed_part_changes_nothing() -> Result<()> {
    let mut fx = Fixture::new()?;
    fx.show("Telemarketer", false)?;
    let part = fx.manager.first_part().context("no parts")?;
    fx.manager.animate("run", part, None);

    let before: PartState = fx.manager.part_state(part).cloned().context("state")?;
    let log_len = fx.manager.scene().log().len();
    fx.manager.increment_pose(3, part);
    fx.manager.increment_pose(-1, part);

    assert_eq!(fx.manager.part_state(part), Some(&before));
    assert_eq!(fx.manager.scene().log().len(), log_len);
    Ok(())
}

#[test]
fn stepping_a_clip_without_frames_changes_nothing() -> Result<()> {
    let mut fx = Fixture::new()?;
    fx.manager.scene_mut().set_frame_count(WALK, 0);
    fx.show("Telemarketer", false)?;
    let part = fx.manager.first_part().context("no parts")?;
    fx.manager.animate("walk", part, None);
    fx.manager.set_pose_mode(true, part);

    let before: PartState = fx.manager.part_state(part).cloned().context("state")?;
    assert_eq!(
        before,
        PartState {
            posed: true,
            animation: Some("walk".into()),
            frame: 0,
        }
    );
    let log_len = fx.manager.scene().log().len();
    fx.manager.increment_pose(-3, part);

    assert_eq!(fx.manager.part_state(part), Some(&before));
    assert_eq!(fx.manager.scene().log().len(), log_len);
    Ok(())
}

#[test]
fn posing_mid_one_shot_freezes_the_reported_frame() -> Result<()> {
    let mut fx = Fixture::new()?;
    fx.show("Telemarketer", false)?;
    let part = fx.manager.first_part().context("no parts")?;

    fx.manager.animate("walk", part, Some(10));
    fx.manager.update(0.1);
    fx.manager.set_pose_mode(true, part);

    let frozen = Some(Playback::Posed {
        animation: "walk".into(),
        frame: 12,
    });
    assert_eq!(fx.playback(MODEL_ROOT), frozen);
    assert_eq!(
        fx.manager.part_state(part),
        Some(&PartState {
            posed: true,
            animation: Some("walk".into()),
            frame: 12,
        })
    );

    // the dropped one-shot never hands over to its loop
    fx.manager.update(2.0);
    assert_eq!(fx.manager.chain(), &ChainState::Idle);
    assert!(fx.manager.is_posed(part));
    assert_eq!(fx.playback(MODEL_ROOT), frozen);
    Ok(())
}

#[test]
fn preserved_pose_follows_the_animation_name() -> Result<()> {
    let mut fx = Fixture::new()?;
    fx.show("Telemarketer", false)?;
    let part = fx.manager.first_part().context("no parts")?;
    fx.manager.animate("walk", part, None);
    fx.manager.set_pose_mode(true, part);
    fx.manager.increment_pose(6, part);

    fx.show("Bean Counter", true)?;
    let part = fx.manager.part(MODEL_ROOT).context("no modelRoot")?;
    assert_eq!(
        fx.manager.part_state(part),
        Some(&PartState {
            posed: true,
            animation: Some("walk".into()),
            frame: 6,
        })
    );
    assert_eq!(
        fx.playback(MODEL_ROOT),
        Some(Playback::Posed {
            animation: "walk".into(),
            frame: 6
        })
    );

    // the boiler has no walk cycle, so the part falls back to idle
    fx.show("The Boiler", true)?;
    let part = fx.manager.part(MODEL_ROOT).context("no modelRoot")?;
    assert_eq!(fx.manager.part_state(part), Some(&PartState::default()));
    assert_eq!(fx.manager.current_animation(part), None);
    Ok(())
}

#[test]
fn preserved_loop_resumes_from_its_frame() -> Result<()> {
    let mut fx = Fixture::new()?;
    fx.show("Telemarketer", false)?;
    let part = fx.manager.first_part().context("no parts")?;
    fx.manager.animate("run", part, None);
    fx.manager.update(0.25);

    fx.show("Bean Counter", true)?;
    assert_eq!(
        fx.playback(MODEL_ROOT),
        Some(Playback::Once {
            animation: "run".into(),
            frame: 6.0
        })
    );
    fx.manager.update(1.0);
    assert_eq!(
        fx.manager
            .current_animation(fx.manager.first_part().context("no parts")?)
            .as_deref(),
        Some("run")
    );
    Ok(())
}

#[test]
fn skeletal_round_trip_restores_the_same_descriptor() -> Result<()> {
    let mut fx = Fixture::new()?;
    fx.show("Telemarketer", false)?;
    let original = Arc::clone(fx.manager.descriptor().context("no descriptor")?);

    fx.manager.toggle_skeletal_variant(true)?;
    let skeletal = Arc::clone(fx.manager.descriptor().context("no descriptor")?);
    assert!(matches!(skeletal.kind(), ActorKind::Skelecog(_)));
    assert_eq!(skeletal.name(), "Telemarketer");

    // enabling twice does not rebuild
    fx.manager.toggle_skeletal_variant(true)?;
    let current = fx.manager.descriptor().context("no descriptor")?;
    assert!(Arc::ptr_eq(&skeletal, current));

    fx.manager.toggle_skeletal_variant(false)?;
    let current = fx.manager.descriptor().context("no descriptor")?;
    assert!(Arc::ptr_eq(&original, current));
    assert!(!fx.manager.is_skeletal());
    Ok(())
}

#[test]
fn skeletal_mode_carries_over_while_cycling() -> Result<()> {
    let mut fx = Fixture::new()?;
    fx.show("Telemarketer", false)?;
    fx.manager.toggle_skeletal_variant(true)?;

    let bean_counter = fx.actor("Bean Counter")?;
    fx.manager.set_descriptor(Arc::clone(&bean_counter), false)?;
    let shown = fx.manager.descriptor().context("no descriptor")?;
    assert!(shown.is_skeletal());
    assert!(Arc::ptr_eq(
        fx.manager.skeletal_origin().context("no origin")?,
        &bean_counter
    ));

    fx.show("Senior Vice President (VP)", false)?;
    assert_eq!(
        fx.manager.descriptor().context("no descriptor")?.kind_label(),
        "boss"
    );
    assert!(fx.manager.is_skeletal());

    fx.manager.toggle_skeletal_variant(false)?;
    assert!(!fx.manager.is_skeletal());
    assert_eq!(
        fx.manager.descriptor().context("no descriptor")?.kind_label(),
        "boss"
    );
    Ok(())
}

#[test]
fn rebuilding_several_looping_parts_resumes_only_the_last_mid_clip() -> Result<()> {
    let mut fx = Fixture::new()?;
    fx.show("Senior Vice President (VP)", false)?;
    for name in ["head", "torso", "leg"] {
        let part = fx.manager.part(name).context("missing boss part")?;
        fx.manager.animate("Ff_neutral", part, None);
    }
    fx.manager.update(0.25);

    fx.show("Senior Vice President (VP)", true)?;
    for name in ["head", "torso"] {
        assert_eq!(
            fx.playback(name),
            Some(Playback::Looping {
                animation: "Ff_neutral".into(),
                frame: 0.0
            })
        );
    }
    assert_eq!(
        fx.playback("leg"),
        Some(Playback::Once {
            animation: "Ff_neutral".into(),
            frame: 6.0
        })
    );
    assert!(fx.manager.chain().is_playing());
    Ok(())
}

#[test]
fn switching_to_a_multi_part_rig_leaves_every_part_idle() -> Result<()> {
    let mut fx = Fixture::new()?;
    fx.show("Telemarketer", false)?;
    let part = fx.manager.first_part().context("no parts")?;
    fx.manager.animate("walk", part, None);
    fx.manager.set_pose_mode(true, part);
    fx.manager.increment_pose(5, part);

    fx.show("Senior Vice President (VP)", true)?;
    let names: Vec<&str> = fx
        .manager
        .parts()
        .ids()
        .filter_map(|id| fx.manager.parts().name(id))
        .collect();
    assert_eq!(names, vec!["head", "torso", "leg"]);
    for id in fx.manager.parts().ids() {
        assert_eq!(fx.manager.part_state(id), Some(&PartState::default()));
        assert!(!fx.manager.is_posed(id));
    }
    Ok(())
}

#[test]
fn new_animation_cancels_an_unfinished_one_shot() -> Result<()> {
    let mut fx = Fixture::new()?;
    fx.show("Telemarketer", false)?;
    let part = fx.manager.first_part().context("no parts")?;

    fx.manager.animate("walk", part, Some(10));
    assert!(fx.manager.chain().is_playing());
    assert_eq!(
        fx.playback(MODEL_ROOT),
        Some(Playback::Once {
            animation: "walk".into(),
            frame: 10.0
        })
    );

    fx.manager.animate("run", part, None);
    assert!(!fx.manager.chain().is_playing());
    assert_eq!(
        fx.playback(MODEL_ROOT),
        Some(Playback::Looping {
            animation: "run".into(),
            frame: 0.0
        })
    );

    fx.manager.scene_mut().clear_log();
    fx.manager.update(2.0);
    assert!(fx
        .manager
        .scene()
        .log()
        .iter()
        .all(|entry| !entry.contains("walk")));
    assert_eq!(fx.manager.current_animation(part).as_deref(), Some("run"));
    Ok(())
}

#[test]
fn commanding_another_part_finishes_the_pending_one_shot() -> Result<()> {
    let mut fx = Fixture::new()?;
    fx.show("Senior Vice President (VP)", false)?;
    let head = fx.manager.part("head").context("no head")?;
    let torso = fx.manager.part("torso").context("no torso")?;

    fx.manager.animate("Ff_neutral", head, Some(10));
    fx.manager.animate("Ff_neutral", torso, None);

    assert_eq!(
        fx.playback("head"),
        Some(Playback::Looping {
            animation: "Ff_neutral".into(),
            frame: 0.0
        })
    );
    assert_eq!(
        fx.manager.current_animation(head).as_deref(),
        Some("Ff_neutral")
    );
    Ok(())
}

#[test]
fn unknown_animation_is_ignored() -> Result<()> {
    let mut fx = Fixture::new()?;
    fx.show("Telemarketer", false)?;
    let part = fx.manager.first_part().context("no parts")?;
    fx.manager.animate("walk", part, None);
    fx.manager.animate("moonwalk", part, None);
    assert_eq!(fx.manager.current_animation(part).as_deref(), Some("walk"));
    Ok(())
}

#[test]
fn failed_rebuild_keeps_the_previous_actor() -> Result<()> {
    let mut fx = Fixture::new()?;
    fx.show("Telemarketer", false)?;
    let part = fx.manager.first_part().context("no parts")?;
    fx.manager.animate("walk", part, None);
    fx.manager.set_pose_mode(true, part);
    let actor = fx.manager.actor();
    let descriptor = Arc::clone(fx.manager.descriptor().context("no descriptor")?);

    let broken = fx.actor("Broken")?;
    let err = fx
        .manager
        .set_descriptor(broken, true)
        .expect_err("missing model must fail the rebuild");
    assert!(matches!(err, ActorError::ResourceResolution { .. }));

    assert_eq!(fx.manager.actor(), actor);
    assert!(Arc::ptr_eq(
        &descriptor,
        fx.manager.descriptor().context("no descriptor")?
    ));
    assert!(fx.manager.is_posed(part));
    assert_eq!(fx.manager.scene().live_actor_count(), 1);
    Ok(())
}

#[test]
fn visibility_survives_a_rebuild() -> Result<()> {
    let mut fx = Fixture::new()?;
    fx.show("Telemarketer", false)?;
    fx.manager.set_part_visibility(Region::Head, false);
    fx.manager.toggle_part_visibility(Region::Shadow);

    fx.show("Bean Counter", false)?;
    let root = fx.manager.actor_root().context("no actor")?;
    let head = fx
        .manager
        .scene_mut()
        .find(root, "**/def_head")
        .context("no head node")?;
    let shadow = fx.manager.shadow();

    assert!(fx.manager.scene().is_rendered(root));
    assert!(!fx.manager.scene().is_rendered(head));
    assert!(!fx.manager.scene().is_rendered(shadow));

    // the head stays visible on its own while the body is hidden
    fx.manager.set_part_visibility(Region::Body, false);
    fx.manager.set_part_visibility(Region::Head, true);
    fx.manager.set_part_visibility(Region::Shadow, true);
    assert!(!fx.manager.scene().is_rendered(root));
    assert!(fx.manager.scene().is_rendered(head));
    assert!(fx.manager.scene().is_rendered(shadow));
    Ok(())
}

#[test]
fn smoothing_is_reapplied_to_new_actors() -> Result<()> {
    let mut fx = Fixture::new()?;
    fx.show("Telemarketer", false)?;
    fx.manager.toggle_animation_smoothing();
    fx.show("Bean Counter", false)?;
    let actor = fx.manager.actor().context("no actor")?;
    assert_eq!(fx.manager.scene().frame_blend(actor), Some(false));
    Ok(())
}
