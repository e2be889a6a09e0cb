// f_finale.rs — end-of-episode text crawl timing

use doom_common::doomdef::{GameMode, MAXPLAYERS};

use crate::p_user::Player;
use crate::s_sound::SoundQueue;

/// Tics per character of the text crawl.
pub const TEXTSPEED: i32 = 3;
/// Tics the full text stays up.
pub const TEXTWAIT: i32 = 250;

const E1TEXT: &str = "Once you beat the big badasses and\n\
clean out the moon base you're supposed\n\
to win, aren't you? Aren't you? Where's\n\
your fat reward and ticket home? What\n\
the hell is this? It's not supposed to\n\
end this way!\n\n\
It stinks like rotten meat, but looks\n\
like the lost Deimos base.  Looks like\n\
you're stuck on The Shores of Hell.\n\
The only way out is through.\n\n\
To continue the DOOM experience, play\n\
The Shores of Hell and its amazing\n\
sequel, Inferno!\n";

const E2TEXT: &str = "You've done it! The hideous cyber-\n\
demon lord that ruled the lost Deimos\n\
moon base has been slain and you\n\
are triumphant! But ... where are\n\
you? You clamber to the edge of the\n\
moon and look down to see the awful\n\
truth.\n\n\
Deimos floats above Hell itself!\n\
You've never heard of anyone escaping\n\
from Hell, but you'll make the bastards\n\
sorry they ever heard of you! Quickly,\n\
you rappel down to  the surface of\n\
Hell.\n\n\
Now, it's on to the final chapter of\n\
DOOM! -- Inferno.";

const E3TEXT: &str = "The loathsome spiderdemon that\n\
masterminded the invasion of the moon\n\
bases and caused so much death has had\n\
its ass kicked for all time.\n\n\
A hidden doorway opens and you enter.\n\
You've proven too tough for Hell to\n\
contain, and now Hell at last plays\n\
fair -- for you emerge from the door\n\
to see the green fields of Earth!\n\
Home at last.\n\n\
You wonder what's been happening on\n\
Earth while you were battling evil\n\
unleashed. It's good that no Hell-\n\
spawn could have come through that\n\
door with you ...";

const E4TEXT: &str = "the spider mastermind must have sent forth\n\
its legions of hellspawn before your\n\
final confrontation with that terrible\n\
beast from hell.  but you stepped forward\n\
and brought forth eternal damnation and\n\
suffering upon the horde as a true hero\n\
would in the face of something so evil.\n\n\
besides, someone was gonna pay for what\n\
happened to daisy, your pet rabbit.\n\n\
but now, you see spread before you more\n\
potential pain and gibbitude as a nation\n\
of demons run amok among our cities.\n\n\
next stop, hell on earth!";

const C1TEXT: &str = "YOU HAVE ENTERED DEEPLY INTO THE INFESTED\n\
STARPORT. BUT SOMETHING IS WRONG. THE\n\
MONSTERS HAVE BROUGHT THEIR OWN REALITY\n\
WITH THEM, AND THE STARPORT'S TECHNOLOGY\n\
IS BEING SUBVERTED BY THEIR PRESENCE.\n\n\
AHEAD, YOU SEE AN OUTPOST OF HELL, A\n\
FORTIFIED ZONE. IF YOU CAN GET PAST IT,\n\
YOU CAN PENETRATE INTO THE HAUNTED HEART\n\
OF THE STARBASE AND FIND THE CONTROLLING\n\
SWITCH WHICH HOLDS EARTH'S POPULATION\n\
HOSTAGE.";

const C2TEXT: &str = "YOU HAVE WON! YOUR VICTORY HAS ENABLED\n\
HUMANKIND TO EVACUATE EARTH AND ESCAPE\n\
THE NIGHTMARE.  NOW YOU ARE THE ONLY\n\
HUMAN LEFT ON THE FACE OF THE PLANET.\n\
CANNIBAL MUTATIONS, CARNIVOROUS ALIENS,\n\
AND EVIL SPIRITS ARE YOUR ONLY NEIGHBORS.\n\
YOU SIT BACK AND WAIT FOR DEATH, CONTENT\n\
THAT YOU HAVE SAVED YOUR SPECIES.\n\n\
BUT THEN, EARTH CONTROL BEAMS DOWN A\n\
MESSAGE FROM SPACE: \"SENSORS HAVE LOCATED\n\
THE SOURCE OF THE ALIEN INVASION. IF YOU\n\
GO THERE, YOU MAY BE ABLE TO BLOCK THEIR\n\
ENTRY.  THE ALIEN BASE IS IN THE HEART OF\n\
YOUR OWN HOME CITY, NOT FAR FROM THE\n\
STARPORT.\" SLOWLY AND PAINFULLY YOU GET\n\
UP AND RETURN TO THE FRAY.";

const C3TEXT: &str = "YOU ARE AT THE CORRUPT HEART OF THE CITY,\n\
SURROUNDED BY THE CORPSES OF YOUR ENEMIES.\n\
YOU SEE NO WAY TO DESTROY THE CREATURES'\n\
ENTRYWAY ON THIS SIDE, SO YOU CLENCH YOUR\n\
TEETH AND PLUNGE THROUGH IT.\n\n\
THERE MUST BE A WAY TO CLOSE IT ON THE\n\
OTHER SIDE. WHAT DO YOU CARE IF YOU'VE\n\
GOT TO GO THROUGH HELL TO GET TO IT?";

const C4TEXT: &str = "THE HORRENDOUS VISAGE OF THE BIGGEST\n\
DEMON YOU'VE EVER SEEN CRUMBLES BEFORE\n\
YOU, AFTER YOU PUMP YOUR ROCKETS INTO\n\
HIS EXPOSED BRAIN. THE MONSTER SHRIVELS\n\
UP AND DIES, ITS THRASHING LIMBS\n\
DEVASTATING UNTOLD MILES OF HELL'S\n\
SURFACE.\n\n\
YOU'VE DONE IT. THE INVASION IS OVER.\n\
EARTH IS SAVED. HELL IS A WRECK. YOU\n\
WONDER WHERE BAD FOLKS WILL GO WHEN THEY\n\
DIE, NOW. WIPING THE SWEAT FROM YOUR\n\
FOREHEAD YOU BEGIN THE LONG TREK BACK\n\
HOME. REBUILDING EARTH OUGHT TO BE A\n\
LOT MORE FUN THAN RUINING IT WAS.\n";

const C5TEXT: &str = "CONGRATULATIONS, YOU'VE FOUND THE SECRET\n\
LEVEL! LOOKS LIKE IT'S BEEN BUILT BY\n\
HUMANS, RATHER THAN DEMONS. YOU WONDER\n\
WHO THE INMATES OF THIS CORNER OF HELL\n\
WILL BE.";

const C6TEXT: &str = "CONGRATULATIONS, YOU'VE FOUND THE\n\
SUPER SECRET LEVEL!  YOU'D BETTER\n\
BLAZE THROUGH THIS ONE!\n";

/// Text and background flat for the finale after a level.
pub fn finale_text(gamemode: GameMode, episode: i32, map: i32) -> (&'static str, &'static str) {
    if gamemode == GameMode::Commercial {
        match map {
            6 => (C1TEXT, "SLIME16"),
            11 => (C2TEXT, "RROCK14"),
            20 => (C3TEXT, "RROCK07"),
            30 => (C4TEXT, "RROCK17"),
            15 => (C5TEXT, "RROCK13"),
            31 => (C6TEXT, "RROCK19"),
            _ => (C1TEXT, "SLIME16"),
        }
    } else {
        match episode {
            2 => (E2TEXT, "SFLR6_1"),
            3 => (E3TEXT, "MFLR8_4"),
            4 => (E4TEXT, "MFLR8_3"),
            _ => (E1TEXT, "FLOOR4_8"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinaleStage {
    Text,
    ArtScreen,
    /// Doom II cast call after MAP30.
    Cast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinaleAction {
    Continue,
    /// Doom II continues to the next map after a mid-game text.
    WorldDone,
}

#[derive(Debug, Clone)]
pub struct Finale {
    pub stage: FinaleStage,
    pub count: i32,
    pub text: &'static str,
    pub flat: &'static str,
    gamemode: GameMode,
    episode: i32,
    map: i32,
}

impl Finale {
    pub fn start(gamemode: GameMode, episode: i32, map: i32, sounds: &mut SoundQueue) -> Self {
        let (text, flat) = finale_text(gamemode, episode, map);
        if gamemode == GameMode::Commercial {
            sounds.change_music("read_m", true);
        } else {
            sounds.change_music("victor", true);
        }
        Self {
            stage: FinaleStage::Text,
            count: 0,
            text,
            flat,
            gamemode,
            episode,
            map,
        }
    }

    /// Characters of the text shown so far.
    pub fn visible_chars(&self) -> usize {
        ((self.count - 10).max(0) / TEXTSPEED) as usize
    }

    pub fn ticker(
        &mut self,
        players: &[Player; MAXPLAYERS],
        playeringame: &[bool; MAXPLAYERS],
        sounds: &mut SoundQueue,
    ) -> FinaleAction {
        // check for skipping
        if self.gamemode == GameMode::Commercial && self.count > 50 && self.stage == FinaleStage::Text {
            let pressed = players
                .iter()
                .zip(playeringame)
                .any(|(p, &ingame)| ingame && p.cmd.buttons != 0);
            if pressed {
                if self.map == 30 {
                    self.stage = FinaleStage::Cast;
                    self.count = 0;
                    sounds.change_music("evil", true);
                    return FinaleAction::Continue;
                }
                return FinaleAction::WorldDone;
            }
        }

        // advance animation
        self.count += 1;

        if self.stage == FinaleStage::Text
            && self.gamemode != GameMode::Commercial
            && self.count > self.text.len() as i32 * TEXTSPEED + TEXTWAIT
        {
            self.count = 0;
            self.stage = FinaleStage::ArtScreen;
            if self.episode == 3 {
                sounds.change_music("bunny", true);
            }
        }
        FinaleAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doom_common::d_event::Buttons;

    #[test]
    fn test_episode_text_then_art_screen() {
        let players: [Player; MAXPLAYERS] = Default::default();
        let ingame = [true, false, false, false];
        let mut sounds = SoundQueue::default();
        let mut f = Finale::start(GameMode::Registered, 3, 8, &mut sounds);
        assert_eq!(sounds.take_music().unwrap().lump, "D_VICTOR");
        assert_eq!(f.flat, "MFLR8_4");

        let crawl = E3TEXT.len() as i32 * TEXTSPEED + TEXTWAIT;
        for _ in 0..crawl {
            f.ticker(&players, &ingame, &mut sounds);
        }
        assert_eq!(f.stage, FinaleStage::Text);
        assert_eq!(f.visible_chars(), ((crawl - 10) / TEXTSPEED) as usize);
        f.ticker(&players, &ingame, &mut sounds);
        assert_eq!(f.stage, FinaleStage::ArtScreen);
        assert_eq!(sounds.take_music().unwrap().lump, "D_BUNNY");
    }

    #[test]
    fn test_commercial_text_is_skippable() {
        let mut players: [Player; MAXPLAYERS] = Default::default();
        let ingame = [true, false, false, false];
        let mut sounds = SoundQueue::default();
        let mut f = Finale::start(GameMode::Commercial, 1, 6, &mut sounds);
        assert_eq!(f.text, C1TEXT);

        players[0].cmd.buttons = Buttons::USE.bits();
        for _ in 0..51 {
            assert_eq!(f.ticker(&players, &ingame, &mut sounds), FinaleAction::Continue);
        }
        assert_eq!(f.ticker(&players, &ingame, &mut sounds), FinaleAction::WorldDone);
    }

    #[test]
    fn test_map30_goes_to_cast() {
        let mut players: [Player; MAXPLAYERS] = Default::default();
        let ingame = [true, false, false, false];
        let mut sounds = SoundQueue::default();
        let mut f = Finale::start(GameMode::Commercial, 1, 30, &mut sounds);
        players[0].cmd.buttons = Buttons::ATTACK.bits();
        for _ in 0..60 {
            assert_eq!(f.ticker(&players, &ingame, &mut sounds), FinaleAction::Continue);
        }
        assert_eq!(f.stage, FinaleStage::Cast);
    }
}
